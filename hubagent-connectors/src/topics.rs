//! Hub topic and username layout

use hubagent_core::DeviceIdentity;

/// API version announced in the MQTT username
pub const API_VERSION: &str = "2020-09-30";

/// MQTT names derived from one device identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubTopics {
    telemetry: String,
    cloud_to_device: String,
    username: String,
}

impl HubTopics {
    pub fn new(hub: &str, device_id: &str) -> Self {
        Self {
            // Content type and encoding ride along as percent-encoded system properties
            telemetry: format!(
                "devices/{}/messages/events/$.ct=application%2Fjson&$.ce=UTF-8",
                device_id
            ),
            cloud_to_device: format!("devices/{}/messages/devicebound/#", device_id),
            username: format!("{}/{}/?api-version={}", hub, device_id, API_VERSION),
        }
    }

    pub fn for_identity(identity: &DeviceIdentity) -> Self {
        Self::new(identity.hub(), identity.device_id())
    }

    /// Device-to-cloud telemetry topic
    pub fn telemetry(&self) -> &str {
        &self.telemetry
    }

    /// Subscription filter for cloud-to-device messages
    pub fn cloud_to_device(&self) -> &str {
        &self.cloud_to_device
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}
