use serde::{Deserialize, Serialize};

// The authenticated client an operation is performed for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub client_id: String,
    pub customer_id: String,
    pub service_id: String,
    pub appointment_type_id: String,
}
