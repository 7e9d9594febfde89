//! VPS and packet-8/30 CNI/PIL/text/time decoding and the confirmation
//! state machine that turns repeated noisy receptions into one trustworthy
//! result per source, grounded in `epgvbi/ttxdecode.c`'s
//! `TtxDecode_AddVpsData`/`TtxDecode_GetP830Cni`/`TtxDecode_AddCni`/
//! `TtxDecode_AddText`/`TtxDecode_AddTime`.

use ttxepg_types::codec::{reverse_nibble_bits, unham84_nibble, unparity};
use ttxepg_types::page::Pil;

const PDC_TEXT_LEN: usize = 16;

/// Sentinel PIL value meaning "no PIL was transmitted alongside this CNI".
/// Outside the 20-bit packed PIL range, so it can never collide with a
/// real `Pil::pack20()` result.
const INVALID_PIL: u32 = 0xffff_ffff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CniSource {
    Vps,
    Pdc,
    Ni,
}

#[derive(Debug, Clone, Default)]
struct CniSlot {
    last_cni: u16,
    cni_rep_count: u32,
    out_cni: u16,
    have_cni: bool,

    last_pil: u32,
    pil_rep_count: u32,
    out_pil: u32,
    have_pil: bool,
}

impl CniSlot {
    fn add(&mut self, cni: u16, pil: u32, pdc_immediate: bool) {
        if self.cni_rep_count > 0 && self.last_cni != cni {
            self.cni_rep_count = 0;
        }
        self.last_cni = cni;
        self.cni_rep_count += 1;

        if self.cni_rep_count > 2 || pdc_immediate {
            if self.have_pil && self.out_cni != cni {
                self.have_pil = false;
            }
            self.out_cni = cni;
            self.have_cni = true;
        }

        if pil != INVALID_PIL {
            if self.pil_rep_count > 0 && self.last_pil != pil {
                self.pil_rep_count = 0;
            }
            self.last_pil = pil;
            self.pil_rep_count += 1;

            if (self.pil_rep_count > 2 || pdc_immediate) && self.have_cni && self.out_cni == cni {
                self.out_pil = pil;
                self.have_pil = true;
            }
        }
    }
}

#[derive(Debug, Clone)]
struct TextSlot {
    last_char: [i8; PDC_TEXT_LEN],
    char_rep_count: [u32; PDC_TEXT_LEN],
    out_text: [u8; PDC_TEXT_LEN],
    have_text: bool,
}

impl Default for TextSlot {
    fn default() -> Self {
        TextSlot {
            last_char: [-1; PDC_TEXT_LEN],
            char_rep_count: [0; PDC_TEXT_LEN],
            out_text: [0; PDC_TEXT_LEN],
            have_text: false,
        }
    }
}

impl TextSlot {
    /// Feeds 16 raw (odd-parity-coded) display-text bytes; characters that
    /// fail parity are ignored for that reception but don't reset the other
    /// positions' repetition counts.
    fn add(&mut self, data: &[u8]) {
        let mut min_rep = 3u32;
        for idx in 0..PDC_TEXT_LEN {
            if let Some(c) = unparity(data[idx]) {
                let c = c as i8;
                if self.last_char[idx] != c {
                    self.last_char[idx] = c;
                    self.char_rep_count[idx] = 0;
                } else {
                    self.char_rep_count[idx] += 1;
                }
            }
            min_rep = min_rep.min(self.char_rep_count[idx]);
        }
        if min_rep >= 3 {
            let candidate: [u8; PDC_TEXT_LEN] =
                std::array::from_fn(|i| self.last_char[i].max(0) as u8);
            if !self.have_text || candidate != self.out_text {
                self.out_text = candidate;
                self.have_text = true;
            }
        }
    }

    fn text(&self) -> Option<&str> {
        if !self.have_text {
            return None;
        }
        std::str::from_utf8(&self.out_text).ok().map(|s| s.trim_end())
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct TimeSlot {
    last_time_val: u32,
    last_lto: i32,
    time_rep_count: u32,
    time_val: u32,
    lto: i32,
    have_time: bool,
}

impl TimeSlot {
    fn add(&mut self, time_val: u32, lto: i32) {
        if self.last_lto != lto
            || time_val.wrapping_sub(self.last_time_val) > 2
            || time_val < self.last_time_val
        {
            self.time_rep_count = 0;
        }
        self.last_time_val = time_val;
        self.last_lto = lto;
        self.time_rep_count += 1;
        if self.time_rep_count >= 3 {
            self.time_val = self.last_time_val;
            self.lto = self.last_lto;
            self.have_time = true;
        }
    }
}

/// Decoded, confirmed CNI/PIL/text/time state for one acquisition context.
/// Three independent CNI slots (VPS, PDC, NI) track their own confirmation
/// counters; the teletext-derived wall-clock time is shared across NI/PDC
/// since both packet-8/30 variants carry the same UTC+LTO fields.
#[derive(Debug, Clone, Default)]
pub struct CniState {
    vps: CniSlot,
    pdc: CniSlot,
    ni: CniSlot,
    pdc_text: TextSlot,
    ni_text: TextSlot,
    time: TimeSlot,
}

impl CniState {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot_mut(&mut self, source: CniSource) -> &mut CniSlot {
        match source {
            CniSource::Vps => &mut self.vps,
            CniSource::Pdc => &mut self.pdc,
            CniSource::Ni => &mut self.ni,
        }
    }

    /// Confirmed CNI for one source, or `None` if not yet settled.
    pub fn cni(&self, source: CniSource) -> Option<u16> {
        let slot = match source {
            CniSource::Vps => &self.vps,
            CniSource::Pdc => &self.pdc,
            CniSource::Ni => &self.ni,
        };
        slot.have_cni.then_some(slot.out_cni)
    }

    /// Confirmed PIL for one source, packed to the raw 20-bit form.
    pub fn pil(&self, source: CniSource) -> Option<u32> {
        let slot = match source {
            CniSource::Vps => &self.vps,
            CniSource::Pdc => &self.pdc,
            CniSource::Ni => &self.ni,
        };
        slot.have_pil.then_some(slot.out_pil)
    }

    pub fn pdc_text(&self) -> Option<&str> {
        self.pdc_text.text()
    }

    pub fn ni_text(&self) -> Option<&str> {
        self.ni_text.text()
    }

    /// Confirmed (UTC seconds since 1970-01-01, local time offset in
    /// seconds) pair, once three consistent receptions have landed.
    pub fn time(&self) -> Option<(u32, i32)> {
        self.time.have_time.then_some((self.time.time_val, self.time.lto))
    }

    /// Decodes one VPS line's raw bytes (indexed the same way the original
    /// decoder addresses them: byte 2 for the special-case bit, bytes
    /// 8..11 for the CNI/date/time fields). Bit positions per "VPS
    /// Richtlinie 8R2".
    pub fn add_vps_line(&mut self, data: &[u8; 13]) {
        let cni = ((data[10] as u32 & 0x3) << 10)
            | ((data[11] as u32 & 0xc0) << 2)
            | (data[8] as u32 & 0xc0)
            | (data[11] as u32 & 0x3f);

        if cni == 0 || cni == 0xfff {
            return;
        }
        let mut cni = cni as u16;
        if cni == 0xdc3 {
            // "ARD/ZDF Gemeinsames Vormittagsprogramm": disambiguated by a
            // bit that's otherwise part of the day-of-month field.
            cni = if data[2] & 0x20 != 0 { 0xdc1 } else { 0xdc2 };
        }

        let mday = (data[8] & 0x3e) >> 1;
        let month = ((data[9] & 0xe0) >> 5) | ((data[8] & 1) << 3);
        let hour = data[9] & 0x1f;
        let minute = data[10] >> 2;

        let pil = Pil::from_fields(mday, month, hour, minute).pack20();
        self.slot_mut(CniSource::Vps).add(cni, pil, false);
    }

    /// Decodes one packet-8/30 payload (the 40 bytes past the packet
    /// header) and dispatches to the NI (Format 1) or PDC (Format 2) path.
    pub fn add_p8_30(&mut self, data: &[u8; 40]) {
        let Some(dc_raw) = unham84_nibble(data[0]) else { return };
        let dc = dc_raw >> 1;

        match dc {
            0 => self.add_p8_30_format1(data),
            1 => self.add_p8_30_format2(data),
            _ => {}
        }
    }

    fn add_p8_30_format1(&mut self, data: &[u8; 40]) {
        let cni = ((reverse_bit_order(data[7]) as u32) << 8) | reverse_bit_order(data[8]) as u32;
        if cni != 0 && cni != 0xffff {
            self.slot_mut(CniSource::Ni).add(cni as u16, INVALID_PIL, false);
        }
        self.ni_text.add(&data[20..20 + PDC_TEXT_LEN]);

        let mut lto = ((data[9] as i32 & 0x7f) >> 1) * 30 * 60;
        if data[9] & 0x80 == 0 {
            lto = -lto;
        }

        let bcd = |b: u8, hi: bool| -> i32 {
            (if hi { (b >> 4) as i32 - 1 } else { (b & 0xf) as i32 - 1 }).max(-1)
        };
        let mjd = bcd(data[10], false) * 10000
            + bcd(data[11], true) * 1000
            + bcd(data[11], false) * 100
            + bcd(data[12], true) * 10
            + bcd(data[12], false);
        let utc_h = bcd(data[13], true) * 10 + bcd(data[13], false);
        let utc_m = bcd(data[14], true) * 10 + bcd(data[14], false);
        let utc_s = bcd(data[15], true) * 10 + bcd(data[15], false);

        if (0..24).contains(&utc_h)
            && (0..60).contains(&utc_m)
            && (0..60).contains(&utc_s)
            && mjd >= 40587
            && (-12 * 60 * 60..=12 * 60 * 60).contains(&lto)
        {
            let tv = (mjd - 40587) * 24 * 60 * 60 + utc_h * 60 * 60 + utc_m * 60 + utc_s;
            self.time.add(tv as u32, lto);
        }
    }

    fn add_p8_30_format2(&mut self, data: &[u8; 40]) {
        let mut pdcbuf = [0u8; 9];
        let mut ok = true;
        for (idx, slot) in pdcbuf.iter_mut().enumerate() {
            match unham84_nibble(data[9 + idx]) {
                // CNI and PIL are transmitted MSB first; reverse bit order
                // of each decoded nibble to restore native bit order.
                Some(n) => *slot = reverse_nibble_bits(n),
                None => {
                    ok = false;
                    break;
                }
            }
        }

        if ok {
            // ETS 300 231 §8.2.1
            let cni = ((pdcbuf[0] as u16) << 12)
                | (((pdcbuf[6] & 0x3) as u16) << 10)
                | (((pdcbuf[7] & 0xc) as u16) << 6)
                | (((pdcbuf[1] & 0xc) as u16) << 4)
                | (((pdcbuf[7] & 0x3) as u16) << 4)
                | (pdcbuf[8] & 0xf) as u16;

            if cni != 0 && cni != 0xffff {
                let mday = ((pdcbuf[1] & 0x3) << 3) | ((pdcbuf[2] & 0xe) >> 1);
                let month = ((pdcbuf[2] & 0x1) << 3) | ((pdcbuf[3] & 0xe) >> 1);
                let hour = ((pdcbuf[3] & 0x1) << 4) | pdcbuf[4];
                let minute = (pdcbuf[5] << 2) | ((pdcbuf[6] & 0xc) >> 2);

                let pil = Pil::from_fields(mday, month, hour, minute).pack20();
                // PDC is Hamming-8/4 coded, so one reception is trustworthy.
                self.slot_mut(CniSource::Pdc).add(cni, pil, true);
            }
        }
        self.pdc_text.add(&data[20..20 + PDC_TEXT_LEN]);
    }
}

fn reverse_bit_order(b: u8) -> u8 {
    b.reverse_bits()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vps_cni_needs_three_consistent_receptions() {
        let mut state = CniState::new();
        // ARD/ZDF on VPS, encoded directly as 0xdc1 (bypassing the 0xdc3
        // disambiguation path, which `add_vps_line`'s byte layout tests
        // cover separately).
        let line = vps_line_for(0x0dc1, 12, 4, 11, 15);
        state.add_vps_line(&line);
        state.add_vps_line(&line);
        assert!(state.cni(CniSource::Vps).is_none());
        state.add_vps_line(&line);
        assert_eq!(state.cni(CniSource::Vps), Some(0x0dc1));
    }

    #[test]
    fn vps_cni_mismatch_resets_confirmation_counter() {
        let mut state = CniState::new();
        let a = vps_line_for(0x0dc1, 1, 1, 0, 0);
        let b = vps_line_for(0x0dc2, 1, 1, 0, 0);
        state.add_vps_line(&a);
        state.add_vps_line(&a);
        state.add_vps_line(&b);
        state.add_vps_line(&a);
        state.add_vps_line(&a);
        assert!(state.cni(CniSource::Vps).is_none());
    }

    #[test]
    fn ni_text_needs_three_matching_parity_clean_receptions() {
        let mut state = CniState::new();
        let text = b"Channel One     ";
        let encoded = encode_odd_parity(&text[..PDC_TEXT_LEN]);
        let mut payload = [0u8; 40];
        payload[20..20 + PDC_TEXT_LEN].copy_from_slice(&encoded);
        state.ni_text.add(&payload[20..20 + PDC_TEXT_LEN]);
        state.ni_text.add(&payload[20..20 + PDC_TEXT_LEN]);
        assert!(state.ni_text().is_none());
        state.ni_text.add(&payload[20..20 + PDC_TEXT_LEN]);
        assert_eq!(state.ni_text(), Some("Channel One"));
    }

    #[test]
    fn time_slot_requires_three_consistent_ticks() {
        let mut state = CniState::new();
        state.time.add(1_000_000, 3600);
        state.time.add(1_000_001, 3600);
        assert!(state.time().is_none());
        state.time.add(1_000_002, 3600);
        assert_eq!(state.time(), Some((1_000_002, 3600)));
    }

    #[test]
    fn time_slot_resets_on_lto_change() {
        let mut state = CniState::new();
        state.time.add(1_000_000, 3600);
        state.time.add(1_000_001, 3600);
        state.time.add(1_000_002, 7200);
        state.time.add(1_000_003, 7200);
        assert!(state.time().is_none());
    }

    fn vps_line_for(cni: u16, mday: u8, month: u8, hour: u8, minute: u8) -> [u8; 13] {
        // Inverse of `add_vps_line`'s bit extraction, built by direct
        // assignment into the same byte offsets the decoder reads.
        let mut data = [0u8; 13];
        data[10] = ((cni >> 10) & 0x3) as u8;
        data[8] = (cni as u8 & 0xc0) | ((mday << 1) & 0x3e) | ((month >> 3) & 1);
        data[9] = ((month << 5) & 0xe0) | (hour & 0x1f);
        data[11] = (((cni >> 2) & 0xc0) as u8) | (cni as u8 & 0x3f);
        data[10] |= minute << 2;
        data
    }

    fn encode_odd_parity(text: &[u8]) -> Vec<u8> {
        text.iter()
            .map(|&b| {
                let parity = (b.count_ones() % 2 == 0) as u8;
                b | (parity << 7)
            })
            .collect()
    }
}
