/// Mirrors the nxtvepg `ttx_db_parse` exit-code convention: most
/// callers care only about "wrote a file" vs "found nothing", so this is
/// kept as a small enum with an explicit `u16` mapping rather than a raw
/// integer threaded through the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ParseResultCode {
    Success = 0,
    NoProgrammesFound = 100,
}

impl From<ParseResultCode> for u16 {
    fn from(code: ParseResultCode) -> u16 {
        code as u16
    }
}

impl TryFrom<u16> for ParseResultCode {
    type Error = u16;

    fn try_from(value: u16) -> Result<Self, u16> {
        match value {
            0 => Ok(ParseResultCode::Success),
            100 => Ok(ParseResultCode::NoProgrammesFound),
            other => Err(other),
        }
    }
}

impl ParseResultCode {
    pub fn is_success(self) -> bool {
        matches!(self, ParseResultCode::Success)
    }
}
