use core::fmt::Write;

use rand::RngCore;

use crate::v16::{cp::core::ChargePointCore, drivers::ui::UiAdapter};

impl<U: UiAdapter> ChargePointCore<U> {
    /// Random v4 uuid that is not currently outstanding or queued.
    pub(crate) fn get_uuid(&mut self) -> String {
        loop {
            let id = self.random_uuid();
            let queued = self.outbound_calls.iter().any(|(call, _)| call.unique_id == id);
            if !queued && !self.pending_calls.contains(&id) {
                return id;
            }
        }
    }

    fn random_uuid(&mut self) -> String {
        let mut bytes = [0u8; 16];
        self.rng.fill_bytes(&mut bytes);
        bytes[6] = (bytes[6] & 0x0f) | 0x40;
        bytes[8] = (bytes[8] & 0x3f) | 0x80;
        let mut s = String::with_capacity(36);
        for (i, b) in bytes.iter().enumerate() {
            if i == 4 || i == 6 || i == 8 || i == 10 {
                s.push('-');
            }
            let _ = write!(s, "{:02x}", b);
        }
        s
    }
}
