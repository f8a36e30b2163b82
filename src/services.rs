// Builds the domain services from configuration

use crate::available_times::AvailableTimesService;
use crate::booking::BookingService;
use crate::config::QflowConfig;
use crate::error::Result;
use crate::sender::QflowSender;
use crate::template::{bundled_templates, DirectoryTemplateSource, TemplateSource, TemplateStore};
use crate::time_zone::StaticTimeZoneDictionary;
use crate::transport::{HttpTransport, Transport};
use crate::unit_details::{ServiceDetails, StaticServiceDetails, UnitDetailsService};
use std::sync::Arc;
use tracing::info;

pub struct QflowServices {
    pub available_times: AvailableTimesService,
    pub unit_details: UnitDetailsService,
    pub booking: BookingService,
}

impl QflowServices {
    /// Wires everything over HTTP, with service lookups from the config table.
    pub fn from_config(config: &QflowConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(&config.transport)?);
        let service_details = Arc::new(StaticServiceDetails::new(config.service_units.clone()));
        Self::with_collaborators(config, transport, service_details)
    }

    pub fn with_collaborators(
        config: &QflowConfig,
        transport: Arc<dyn Transport>,
        service_details: Arc<dyn ServiceDetails>,
    ) -> Result<Self> {
        let source: Arc<dyn TemplateSource> = match &config.templates_dir {
            Some(dir) => Arc::new(DirectoryTemplateSource::new(dir)),
            None => Arc::new(bundled_templates()),
        };
        let templates = TemplateStore::new(source);
        let sender = QflowSender::new(transport);
        let time_zones = Arc::new(StaticTimeZoneDictionary::with_overrides(&config.time_zones));

        let services = Self {
            available_times: AvailableTimesService::new(
                sender.clone(),
                &templates,
                &config.service_address.calendar,
            )?,
            unit_details: UnitDetailsService::new(
                service_details,
                sender.clone(),
                time_zones,
                &templates,
                &config.service_address.unit,
            )?,
            booking: BookingService::new(sender, &templates, &config.service_address.booking)?,
        };

        info!(
            templates = templates.cached_count(),
            calendar = %config.service_address.calendar,
            unit = %config.service_address.unit,
            booking = %config.service_address.booking,
            "Qflow services ready"
        );
        Ok(services)
    }
}
