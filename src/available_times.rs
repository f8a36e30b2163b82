// Available appointment times for a calendar, from the suggested slots operation

use crate::client::Client;
use crate::error::{QflowError, Result};
use crate::operations::GET_DYNAMIC_SUGGESTED_SLOTS_2 as SLOTS;
use crate::render::Parameters;
use crate::response::ResponseWrapper;
use crate::sender::QflowSender;
use crate::template::{Template, TemplateStore};
use std::collections::HashMap;
use std::sync::Arc;

pub struct AvailableTimesService {
    sender: QflowSender,
    service_address: String,
    suggested_slots: Arc<Template>,
}

impl AvailableTimesService {
    pub fn new(
        sender: QflowSender,
        templates: &TemplateStore,
        service_address: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            sender,
            service_address: service_address.into(),
            suggested_slots: templates.load(SLOTS.template)?,
        })
    }

    /// `HH:MM` start times in the order the backend lists them.
    pub async fn get_available_times(
        &self,
        client: &Client,
        calendar_id: &str,
    ) -> Result<Vec<String>> {
        let response = self.request_slots(client, calendar_id).await?;
        parse_available_times(&response)
    }

    /// The same times keyed by the calendar date reported in the same reply.
    pub async fn get_available_times_with_calendar_date(
        &self,
        client: &Client,
        calendar_id: &str,
    ) -> Result<HashMap<String, Vec<String>>> {
        let response = self.request_slots(client, calendar_id).await?;
        let available_times = parse_available_times(&response)?;
        let date = response.get_string(SLOTS.calendar_date)?;

        Ok(HashMap::from([(date, available_times)]))
    }

    async fn request_slots(&self, client: &Client, calendar_id: &str) -> Result<ResponseWrapper> {
        let parameters = Parameters::from([
            ("calendarId".to_string(), calendar_id.to_string()),
            (
                "appointmentTypeId".to_string(),
                client.appointment_type_id.clone(),
            ),
        ]);

        self.sender
            .send_request(&self.suggested_slots, &parameters, &self.service_address)
            .await
    }
}

fn parse_available_times(response: &ResponseWrapper) -> Result<Vec<String>> {
    response
        .get_node_list(SLOTS.start_time)?
        .iter()
        .map(|node| convert_minutes_to_hour(&node.text_content()))
        .collect()
}

/// Minutes since midnight to a zero-padded `HH:MM`.
pub fn convert_minutes_to_hour(minutes: &str) -> Result<String> {
    let time_in_minutes: u32 = minutes.parse().map_err(|_| {
        QflowError::MalformedResponse(format!(
            "expected minutes since midnight, found {:?}",
            minutes
        ))
    })?;

    Ok(format!("{:02}:{:02}", time_in_minutes / 60, time_in_minutes % 60))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::bundled_templates;
    use crate::transport::mock::MockTransport;
    use test_case::test_case;

    const SLOTS_RESPONSE: &str = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body>
    <GetDynamicSuggestedSlots2Response xmlns="http://www.qnomy.com/Services">
      <GetDynamicSuggestedSlots2Result>
        <AvailableSequences>
          <CalendarDate>2016-03-21</CalendarDate>
        </AvailableSequences>
        <SuggestedSlots>
          <DynamicCalendarSuggestedSlotItem><StartTime>540</StartTime></DynamicCalendarSuggestedSlotItem>
          <DynamicCalendarSuggestedSlotItem><StartTime>570</StartTime></DynamicCalendarSuggestedSlotItem>
          <DynamicCalendarSuggestedSlotItem><StartTime>600</StartTime></DynamicCalendarSuggestedSlotItem>
        </SuggestedSlots>
      </GetDynamicSuggestedSlots2Result>
    </GetDynamicSuggestedSlots2Response>
  </s:Body>
</s:Envelope>"#;

    fn client() -> Client {
        Client {
            client_id: "C-1".to_string(),
            customer_id: "1001".to_string(),
            service_id: "12".to_string(),
            appointment_type_id: "7".to_string(),
        }
    }

    fn service(transport: Arc<MockTransport>) -> AvailableTimesService {
        let templates = TemplateStore::new(Arc::new(bundled_templates()));
        AvailableTimesService::new(QflowSender::new(transport), &templates, "http://qflow/calendar")
            .unwrap()
    }

    #[test_case("0", "00:00"; "#1 midnight")]
    #[test_case("90", "01:30"; "#2 ninety minutes")]
    #[test_case("540", "09:00"; "#3 nine o'clock")]
    #[test_case("725", "12:05"; "#4 padded minutes")]
    #[test_case("1439", "23:59"; "#5 last minute")]
    fn test_convert_minutes_to_hour(minutes: &str, expected: &str) {
        assert_eq!(convert_minutes_to_hour(minutes).unwrap(), expected);
    }

    #[test]
    fn test_convert_every_minute_of_the_day() {
        for m in 0..1440u32 {
            let formatted = convert_minutes_to_hour(&m.to_string()).unwrap();
            assert_eq!(formatted.len(), 5);
            assert_eq!(&formatted[2..3], ":");
            assert_eq!(formatted[..2].parse::<u32>().unwrap(), m / 60);
            assert_eq!(formatted[3..].parse::<u32>().unwrap(), m % 60);
        }
    }

    #[test_case(""; "#1 empty")]
    #[test_case("nine"; "#2 word")]
    #[test_case("-5"; "#3 negative")]
    fn test_convert_rejects_non_minutes(minutes: &str) {
        assert!(matches!(
            convert_minutes_to_hour(minutes),
            Err(QflowError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_get_available_times() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_with(SLOTS_RESPONSE);
        let service = service(transport.clone());

        let times = service.get_available_times(&client(), "42").await.unwrap();

        assert_eq!(times, vec!["09:00", "09:30", "10:00"]);
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].0, "http://qflow/calendar");
        assert!(requests[0].1.contains("<calendarId>42</calendarId>"));
        assert!(requests[0].1.contains("<appointmentTypeId>7</appointmentTypeId>"));
    }

    #[tokio::test]
    async fn test_with_calendar_date_uses_one_call() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_with(SLOTS_RESPONSE);
        transport.respond_with(SLOTS_RESPONSE);
        let service = service(transport.clone());

        let by_date = service
            .get_available_times_with_calendar_date(&client(), "42")
            .await
            .unwrap();
        assert_eq!(transport.requests().len(), 1);

        let plain = service.get_available_times(&client(), "42").await.unwrap();
        assert_eq!(by_date.len(), 1);
        assert_eq!(by_date.get("2016-03-21"), Some(&plain));
    }

    #[tokio::test]
    async fn test_no_slots() {
        let transport = Arc::new(MockTransport::new());
        transport.respond_with(
            "<GetDynamicSuggestedSlots2Response><GetDynamicSuggestedSlots2Result/></GetDynamicSuggestedSlots2Response>",
        );
        let service = service(transport);

        let by_date = service
            .get_available_times_with_calendar_date(&client(), "42")
            .await
            .unwrap();

        assert_eq!(by_date, HashMap::from([(String::new(), Vec::new())]));
    }

    #[tokio::test]
    async fn test_bad_start_time_fails_whole_call() {
        let transport = Arc::new(MockTransport::new());
        transport
            .respond_with(&SLOTS_RESPONSE.replace("<StartTime>570</StartTime>", "<StartTime/>"));
        let service = service(transport);

        let result = service.get_available_times(&client(), "42").await;
        assert!(matches!(result, Err(QflowError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let transport = Arc::new(MockTransport::new());
        transport.fail_with("connection refused");
        let service = service(transport);

        let result = service.get_available_times(&client(), "42").await;
        assert!(matches!(result, Err(QflowError::Transport { .. })));
    }
}
