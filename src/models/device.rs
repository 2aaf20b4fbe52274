// ============================================================================
// VIDEO INPUT DEVICE - Cámara reportada por el motor de escaneo
// ============================================================================

use serde::{Deserialize, Serialize};

/// Cámara disponible según el motor.
/// Inmutable una vez enumerada: la lista se vuelve a pedir bajo demanda,
/// no se trackea hot-plug de forma incremental.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoInputDevice {
    pub device_id: String,
    pub label: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_device_list() {
        let json = r#"[{"deviceId":"A","label":"Cam A"},{"deviceId":"B","label":"Cam B"}]"#;
        let devices: Vec<VideoInputDevice> = serde_json::from_str(json).unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].device_id, "A");
        assert_eq!(devices[1].label, "Cam B");
    }

    #[test]
    fn test_serialize_camel_case() {
        let device = VideoInputDevice {
            device_id: "front".to_string(),
            label: "Cámara frontal".to_string(),
        };
        let json = serde_json::to_string(&device).unwrap();
        assert!(json.contains("\"deviceId\":\"front\""));
    }
}
