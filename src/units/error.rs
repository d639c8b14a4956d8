use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum UnitError {
    #[error("Could not parse '{0}' as a frequency")]
    UnknownFreq(String),

    #[error("Successfully parsed a frequency unit, but could not parse the numerical component of '{0}'")]
    GotFreqUnitButCantParse(String),

    #[error("'{0}' is not a supported frequency unit; supported units are Hz, kHz, MHz and GHz")]
    UnknownFreqUnit(String),

    #[error("MEAS_FREQ_REF value {0} is not a known frequency reference frame")]
    UnknownFrame(i32),

    #[error("Cannot compute a Doppler velocity with a rest frequency of zero")]
    ZeroRestFreq,
}
