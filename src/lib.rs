// Qflow appointment integration: template-driven SOAP requests and path-based response extraction

pub mod available_times;
pub mod booking;
pub mod client;
pub mod config;
pub mod error;
pub mod logger;
pub mod operations;
pub mod render;
pub mod response;
pub mod sender;
pub mod services;
pub mod template;
pub mod time_zone;
pub mod transport;
pub mod unit_details;

// Re-export key types for convenience
pub use available_times::{convert_minutes_to_hour, AvailableTimesService};
pub use booking::{BookingConfirmation, BookingOutcome, BookingService};
pub use client::Client;
pub use config::{QflowConfig, ServiceAddresses, TransportConfig};
pub use error::{QflowError, Result};
pub use render::{render, Parameters};
pub use response::{Node, PathExpr, ResponseWrapper};
pub use sender::QflowSender;
pub use services::QflowServices;
pub use template::{
    bundled_templates, DirectoryTemplateSource, InMemoryTemplateSource, Template, TemplateSource,
    TemplateStore,
};
pub use time_zone::{StaticTimeZoneDictionary, TimeZoneDictionary};
pub use transport::{HttpTransport, Transport};
pub use unit_details::{ServiceDetails, StaticServiceDetails, UnitDetails, UnitDetailsService};
