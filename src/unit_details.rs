// Unit (office) lookups: address, current local time and full details

use crate::error::{QflowError, Result};
use crate::operations::{GET_UNIT, GET_UNIT_LOCAL_TIME};
use crate::render::Parameters;
use crate::response::ResponseWrapper;
use crate::sender::QflowSender;
use crate::template::{Template, TemplateStore};
use crate::time_zone::TimeZoneDictionary;
use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Resolves which unit provides a service. Consulted on every call.
#[async_trait]
pub trait ServiceDetails: Send + Sync {
    async fn unit_id_for_service(&self, service_id: &str) -> Result<String>;
}

// Service -> unit table taken from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticServiceDetails {
    units: HashMap<String, String>,
}

impl StaticServiceDetails {
    pub fn new(units: HashMap<String, String>) -> Self {
        Self { units }
    }
}

#[async_trait]
impl ServiceDetails for StaticServiceDetails {
    async fn unit_id_for_service(&self, service_id: &str) -> Result<String> {
        self.units
            .get(service_id)
            .cloned()
            .ok_or_else(|| QflowError::UnknownService(service_id.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitDetails {
    pub id: String,
    pub address: String,
    pub time_zone: String,
}

pub struct UnitDetailsService {
    service_details: Arc<dyn ServiceDetails>,
    sender: QflowSender,
    time_zones: Arc<dyn TimeZoneDictionary>,
    service_address: String,
    get_unit: Arc<Template>,
    get_unit_local_time: Arc<Template>,
}

impl UnitDetailsService {
    pub fn new(
        service_details: Arc<dyn ServiceDetails>,
        sender: QflowSender,
        time_zones: Arc<dyn TimeZoneDictionary>,
        templates: &TemplateStore,
        service_address: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            service_details,
            sender,
            time_zones,
            service_address: service_address.into(),
            get_unit: templates.load(GET_UNIT.template)?,
            get_unit_local_time: templates.load(GET_UNIT_LOCAL_TIME.template)?,
        })
    }

    pub async fn get_unit_address(&self, unit_id: &str) -> Result<String> {
        let response = self.send(&self.get_unit, unit_id).await?;
        response.get_string(GET_UNIT.address)
    }

    pub async fn get_unit_current_local_time(&self, unit_id: &str) -> Result<NaiveDateTime> {
        let response = self.send(&self.get_unit_local_time, unit_id).await?;
        parse_local_date_time(&response.get_string(GET_UNIT_LOCAL_TIME.local_time)?)
    }

    pub async fn get_unit_details(&self, unit_id: &str) -> Result<UnitDetails> {
        let response = self.send(&self.get_unit, unit_id).await?;
        let id = response.get_string(GET_UNIT.unit_id)?;
        let address = response.get_string(GET_UNIT.address)?;
        let time_zone_id = response.get_string(GET_UNIT.time_zone_id)?;

        Ok(UnitDetails {
            id,
            address,
            time_zone: self.time_zones.time_zone_iana(&time_zone_id)?,
        })
    }

    pub async fn get_unit_address_by_service_id(&self, service_id: &str) -> Result<String> {
        let unit_id = self.service_details.unit_id_for_service(service_id).await?;
        self.get_unit_address(&unit_id).await
    }

    pub async fn get_unit_current_local_time_by_service_id(
        &self,
        service_id: &str,
    ) -> Result<NaiveDateTime> {
        let unit_id = self.service_details.unit_id_for_service(service_id).await?;
        self.get_unit_current_local_time(&unit_id).await
    }

    pub async fn get_unit_details_by_service_id(&self, service_id: &str) -> Result<UnitDetails> {
        let unit_id = self.service_details.unit_id_for_service(service_id).await?;
        self.get_unit_details(&unit_id).await
    }

    async fn send(&self, template: &Template, unit_id: &str) -> Result<ResponseWrapper> {
        let parameters = Parameters::from([("unitId".to_string(), unit_id.to_string())]);
        self.sender
            .send_request(template, &parameters, &self.service_address)
            .await
    }
}

/// Parses `YYYY-MM-DDTHH:MM[:SS[.fraction]]`.
pub fn parse_local_date_time(value: &str) -> Result<NaiveDateTime> {
    value
        .parse::<NaiveDateTime>()
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M"))
        .map_err(|source| QflowError::InvalidDateTime {
            value: value.to_string(),
            source,
        })
}
