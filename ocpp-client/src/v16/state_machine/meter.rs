use chrono::{DateTime, Utc};
use cpsim_core::v16::{
    messages::MeterValuesRequest,
    types::{Location, Measurand, MeterValue, ReadingContext, SampledValue, UnitOfMeasure},
};

use crate::v16::{
    cp::core::ChargePointCore,
    drivers::{timers::TimerId, ui::UiAdapter},
};

use super::{call::CallContext, connector::ConnectorState, session::SessionState};

fn sampled_value(value: u64, measurand: Measurand, context: ReadingContext) -> SampledValue {
    let unit = match measurand {
        Measurand::PowerActiveImport => UnitOfMeasure::W,
        _ => UnitOfMeasure::Wh,
    };
    SampledValue {
        value: value.to_string(),
        context: Some(context),
        format: None,
        measurand: Some(measurand),
        phase: None,
        location: Some(Location::Outlet),
        unit: Some(unit),
    }
}

impl<U: UiAdapter> ChargePointCore<U> {
    pub(crate) fn start_meter(&mut self, connector_id: usize) {
        let now = self.now();
        if let Some(connector) = self.connector_mut(connector_id) {
            connector.last_sample = now;
        }
        self.set_meter_timer(connector_id);
    }

    /// A MeterValueSampleInterval of 0 disables periodic samples.
    fn set_meter_timer(&mut self, connector_id: usize) {
        match self.configs.meter_value_sample_interval.value {
            0 => self.remove_timeout(TimerId::MeterSample(connector_id)),
            interval => self.add_timeout(TimerId::MeterSample(connector_id), interval),
        }
    }

    pub(crate) fn stop_meter(&mut self, connector_id: usize) {
        self.remove_timeout(TimerId::MeterSample(connector_id));
    }

    pub(crate) fn reschedule_meters(&mut self) {
        for connector_id in self.connector_ids() {
            let charging = self
                .connector(connector_id)
                .is_some_and(|c| c.state == ConnectorState::Charging);
            if charging {
                self.set_meter_timer(connector_id);
            }
        }
    }

    /// Integrates the simulated power since the last sample while charging.
    /// `at_least_one_wh` makes every periodic tick visible on the register.
    /// Returns the register in Wh.
    pub(crate) fn advance_meter(&mut self, connector_id: usize, at_least_one_wh: bool) -> u64 {
        let now = self.now();
        let power_w = self.config.simulated_power_w;
        let Some(connector) = self.connector_mut(connector_id) else {
            return 0;
        };
        if connector.state == ConnectorState::Charging {
            let elapsed_us = now.duration_since(connector.last_sample).as_micros();
            // W * us / 3.6e6 = mWh
            let mut delta = u64::try_from(power_w as u128 * elapsed_us / 3_600_000).unwrap_or(u64::MAX);
            if at_least_one_wh {
                delta = delta.max(1000);
            }
            connector.meter_mwh = connector.meter_mwh.saturating_add(delta);
        }
        connector.last_sample = now;
        let wh = connector.meter_wh();
        if let Some(transaction) = connector.transaction.as_mut() {
            transaction.meter_value = transaction.meter_value.max(wh);
        }
        wh
    }

    fn periodic_sample(&self, wh: u64, timestamp: DateTime<Utc>) -> MeterValue {
        let sampled_value = self
            .configs
            .meter_values_sampled_data
            .value
            .iter()
            .filter_map(|measurand| match measurand {
                Measurand::EnergyActiveImportRegister => Some(sampled_value(
                    wh,
                    *measurand,
                    ReadingContext::SamplePeriodic,
                )),
                Measurand::PowerActiveImport => Some(sampled_value(
                    self.config.simulated_power_w,
                    *measurand,
                    ReadingContext::SamplePeriodic,
                )),
                _ => None,
            })
            .collect();
        MeterValue {
            timestamp,
            sampled_value,
        }
    }

    pub(crate) fn transaction_end_data(&self, wh: u64, timestamp: DateTime<Utc>) -> Vec<MeterValue> {
        vec![MeterValue {
            timestamp,
            sampled_value: vec![sampled_value(
                wh,
                Measurand::EnergyActiveImportRegister,
                ReadingContext::TransactionEnd,
            )],
        }]
    }

    pub(crate) fn meter_sample_expired(&mut self, connector_id: usize) {
        let charging = self
            .connector(connector_id)
            .is_some_and(|c| c.state == ConnectorState::Charging && c.transaction.is_some());
        if !charging {
            return;
        }
        let wh = self.advance_meter(connector_id, true);
        self.publish_connector(connector_id);
        self.set_meter_timer(connector_id);

        let transaction_id = self
            .connector(connector_id)
            .and_then(|c| c.transaction.as_ref())
            .filter(|t| !t.is_provisional())
            .map(|t| t.transaction_id);
        if self.session_state != SessionState::Registered || transaction_id.is_none() {
            return;
        }
        let req = MeterValuesRequest {
            connector_id,
            transaction_id,
            meter_value: vec![self.periodic_sample(wh, self.timestamp())],
        };
        self.enqueue_call(CallContext::MeterValues { connector_id }, req);
    }
}
