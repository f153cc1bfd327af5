//! Known control and asset paths.

/// Establishes the session; no reply is sent.
pub const AUTHENTICATE: &str = "/remote/controller/authenticate";

/// Posts an order envelope; no reply is sent.
pub const POST_ORDER: &str = "/remote/controller/postOrder";

/// Device hardware and network status.
pub const GET_DEVICE_STATUS: &str = "/remote/controller/getDeviceStatus";

/// Streaming state.
pub const GET_LIVE_STATUS: &str = "/remote/controller/getLiveStatus";

/// Program sources.
pub const GET_DIRECTOR_LIST: &str = "/remote/controller/getDirectorList";

/// Overlays (materials).
pub const GET_MATERIAL_LIST: &str = "/remote/controller/getMaterialList";

/// Audio channels.
pub const GET_MIXER_LIST: &str = "/remote/controller/getMixerList";

/// Liveness probe.
pub const HEARTBEAT: &str = "/remote/controller/heartbeat";

/// Scene preview images, served over HTTP on the asset port.
pub const SCENE_IMAGES: &str = "/remote/controller/images/scenes";

/// Normalizes a path so it always starts with `/`.
#[inline]
#[must_use]
pub fn normalize(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("heartbeat"), "/heartbeat");
        assert_eq!(normalize("/heartbeat"), "/heartbeat");
    }
}
