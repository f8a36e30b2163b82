// Remote operations: request template key plus the response paths each one reads.
// These paths are the contract with the Qflow schema.

pub struct SuggestedSlotsOperation {
    pub template: &'static str,
    pub start_time: &'static str,
    pub calendar_date: &'static str,
}

pub const GET_DYNAMIC_SUGGESTED_SLOTS_2: SuggestedSlotsOperation = SuggestedSlotsOperation {
    template: "GetDynamicSuggestedSlots2.mustache",
    start_time: "//GetDynamicSuggestedSlots2Response/GetDynamicSuggestedSlots2Result/SuggestedSlots/DynamicCalendarSuggestedSlotItem/StartTime",
    calendar_date: "//GetDynamicSuggestedSlots2Response/GetDynamicSuggestedSlots2Result/AvailableSequences/CalendarDate",
};

pub struct GetUnitOperation {
    pub template: &'static str,
    pub unit_id: &'static str,
    pub time_zone_id: &'static str,
    pub address: &'static str,
}

pub const GET_UNIT: GetUnitOperation = GetUnitOperation {
    template: "GetUnit.mustache",
    unit_id: "//GetResponse/GetResult/Id",
    time_zone_id: "//GetResponse/GetResult/TimeZoneId",
    address: "//GetResponse/GetResult/Address",
};

pub struct GetUnitLocalTimeOperation {
    pub template: &'static str,
    pub local_time: &'static str,
}

pub const GET_UNIT_LOCAL_TIME: GetUnitLocalTimeOperation = GetUnitLocalTimeOperation {
    template: "GetUnitLocalTime.mustache",
    local_time: "//GetLocalTimeResponse/GetLocalTimeResult",
};

pub struct SetAppointmentOperation {
    pub template: &'static str,
    pub process_id: &'static str,
}

pub const SET_APPOINTMENT: SetAppointmentOperation = SetAppointmentOperation {
    template: "SetAppointment.mustache",
    process_id: "//SetAppointmentResponse/SetAppointmentResult/ProcessId",
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::PathExpr;

    #[test]
    fn test_all_paths_parse() {
        for path in [
            GET_DYNAMIC_SUGGESTED_SLOTS_2.start_time,
            GET_DYNAMIC_SUGGESTED_SLOTS_2.calendar_date,
            GET_UNIT.unit_id,
            GET_UNIT.time_zone_id,
            GET_UNIT.address,
            GET_UNIT_LOCAL_TIME.local_time,
            SET_APPOINTMENT.process_id,
        ] {
            assert!(PathExpr::parse(path).is_ok(), "Invalid path {}", path);
        }
    }
}
