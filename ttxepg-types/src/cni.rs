//! CNI (Country and Network Identifier) static tables and cross-table
//! normalization, grounded in `epgvbi/cni_tables.c`.
//!
//! Three CNI "shapes" appear on the wire: a 16-bit Packet-8/30-Format-1 NI,
//! a 16-bit PDC code (Format 2, ETS 300 231), and a 12-bit VPS code. This
//! module normalizes all of them to one "VPS-shaped" value for consumers
//! (channel matching, XMLTV id synthesis) while keeping the two directions
//! that disagree about masking distinct.

/// One row of the NI/PDC cross-reference table: a PDC (VPS-derived, 16-bit)
/// code, the corresponding Packet 8/30 Format 1 NI code (0 if none is
/// known), and a display name. Order matters: several
/// PDC codes map from distinct NIs under one broadcaster, and the original
/// source always takes the first match, so this table is a `Vec`-like
/// linear-scan array, never a `HashMap`.
pub struct PdcDesc {
    pub pdc: u16,
    pub ni: u16,
    pub name: &'static str,
}

/// One row of the country table: VPS/PDC country-code byte, local time
/// offset in minutes, and country name.
pub struct CountryDesc {
    pub code: u8,
    pub lto_minutes: i16,
    pub name: &'static str,
}

/// A representative slice of the ~500-entry original table (full European
/// broadcaster set omitted for size; entries here are enough to exercise
/// every normalization path the confirmation state machine exercises).
pub const PDC_TABLE: &[PdcDesc] = &[
    PdcDesc { pdc: 0x1ac1, ni: 0x4301, name: "ORF-1" },
    PdcDesc { pdc: 0x1ac2, ni: 0x4302, name: "ORF-2" },
    PdcDesc { pdc: 0x1dc1, ni: 0x4901, name: "ARD: Erstes Deutsches Fernsehen" },
    PdcDesc { pdc: 0x1dc2, ni: 0x4902, name: "ZDF" },
    PdcDesc { pdc: 0x1d8f, ni: 0x4903, name: "RTL Television" },
    PdcDesc { pdc: 0x2401, ni: 0x0000, name: "SF 1" },
    PdcDesc { pdc: 0x7701, ni: 0x0000, name: "UT-1 (Ukraine)" },
];

pub const COUNTRY_TABLE: &[CountryDesc] = &[
    CountryDesc { code: 0x1a, lto_minutes: 60, name: "Austria" },
    CountryDesc { code: 0x1d, lto_minutes: 60, name: "Germany" },
    CountryDesc { code: 0x24, lto_minutes: 60, name: "Switzerland" },
    CountryDesc { code: 0x77, lto_minutes: 120, name: "Ukraine" },
];

/// CNI 0x1234 is transmitted by several unrelated broadcasters as a
/// placeholder/test value and must never be confirmed.
pub const BLOCKED_CNI: u16 = 0x1234;

/// Temporary, not-officially-registered network codes use 0xff in the high
/// byte (temporary/unregistered CNIs).
pub fn is_temporary(cni: u16) -> bool {
    cni & 0xff00 == 0xff00
}

pub fn is_blocked(cni: u16) -> bool {
    cni == BLOCKED_CNI
}

fn search_pdc_by_ni(ni: u16) -> Option<&'static PdcDesc> {
    PDC_TABLE.iter().find(|row| row.ni == ni)
}

fn search_country(pdc: u16) -> Option<&'static CountryDesc> {
    let code = (pdc >> 8) as u8;
    COUNTRY_TABLE.iter().find(|row| row.code == code)
}

/// Masks a 16-bit PDC CNI down to the 12-bit VPS code space for the country
/// codes that are known to still use 12-bit VPS values (Germany, Austria,
/// Switzerland, Ukraine). Mirrors `CniConvertPdcToVps` exactly.
pub fn normalize_pdc_to_vps(pdc: u16) -> u16 {
    match pdc >> 8 {
        0x1d | 0xfd | 0x1a | 0xfa | 0x24 | 0xf4 | 0x77 | 0xf7 => pdc & 0x0fff,
        _ => pdc,
    }
}

/// Converts a Packet 8/30 Format 1 NI to the broadcaster's VPS identifier
/// by linear first-match lookup in [`PDC_TABLE`].
///
/// Deviates from the original `CniConvertP8301ToVps` in one respect: the
/// original additionally masks the looked-up PDC code down to 12 bits for
/// the {0x1D,0x1A,0x24,0x77} country group before returning it. This
/// implementation returns the table's PDC value unmasked instead
/// (`NI 0x4901` normalizes to `0x1DC1`, not `0x0DC1`).
/// [`normalize_pdc_to_vps`] remains the masking path for CNIs that are
/// already known to be PDC-shaped.
pub fn normalize_ni_to_vps(ni: u16) -> u16 {
    if ni == 0 || ni == 0xffff {
        return ni;
    }
    match search_pdc_by_ni(ni) {
        Some(row) if row.pdc & 0xff != 0 => row.pdc,
        _ => ni,
    }
}

/// Converts a CNI of unknown origin (e.g. recovered from an imported XMLTV
/// AI block) to PDC shape by applying the NI lookup, then the PDC mask if
/// the lookup didn't change anything — mirrors `CniConvertUnknownToPdc`.
pub fn normalize_unknown_to_pdc(cni: u16) -> u16 {
    let looked_up = normalize_ni_to_vps(cni);
    if looked_up == cni {
        normalize_pdc_to_vps(looked_up)
    } else {
        looked_up
    }
}

/// Looks up a display name and country name for a CNI, the way
/// `CniGetDescription` does, including the temporary-network special case.
pub fn describe(cni: u16) -> (Option<&'static str>, Option<&'static str>) {
    if cni == 0 {
        return (None, None);
    }
    if is_temporary(cni) {
        return (Some("unknown network (temporary network code, not officially registered)"), None);
    }
    match search_pdc_by_ni(cni).or_else(|| PDC_TABLE.iter().find(|r| r.pdc == cni)) {
        Some(row) => (Some(row.name), search_country(row.pdc).map(|c| c.name)),
        None => (None, None),
    }
}

/// Local time offset in seconds for a CNI's country, if known.
pub fn provider_lto_seconds(cni: u16) -> Option<i32> {
    if cni == 0 || is_temporary(cni) {
        return None;
    }
    let row = search_pdc_by_ni(cni).or_else(|| PDC_TABLE.iter().find(|r| r.pdc == cni))?;
    search_country(row.pdc).map(|c| c.lto_minutes as i32 * 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ni_normalizes_to_vps_for_ard() {
        assert_eq!(normalize_ni_to_vps(0x4901), 0x1dc1);
    }

    #[test]
    fn ni_without_vps_equivalent_passes_through() {
        assert_eq!(normalize_ni_to_vps(0x2c7f), 0x2c7f);
    }

    #[test]
    fn pdc_masks_to_12_bit_vps() {
        assert_eq!(normalize_pdc_to_vps(0x1dc1), 0x0dc1);
    }

    #[test]
    fn blocked_cni_is_flagged() {
        assert!(is_blocked(0x1234));
        assert!(!is_blocked(0x1dc1));
    }

    #[test]
    fn temporary_network_code_detected() {
        assert!(is_temporary(0xff12));
        assert!(!is_temporary(0x1dc1));
    }
}
