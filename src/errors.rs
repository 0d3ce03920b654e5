use failure::Fail;

#[derive(Debug, Fail)]
pub enum SgdTextError {
    #[fail(display = "Unknown slot: '{}'", _0)]
    UnknownSlot(String),
    #[fail(
        display = "Value '{}' of categorical slot '{}' is not among its possible values",
        _1, _0
    )]
    ValueNotInOptions(String, String),
    #[fail(
        display = "Categorical slot '{}' has {} possible values, more than the option alphabet",
        _0, _1
    )]
    TooManyOptions(String, usize),
    #[fail(display = "Requested slot '{}' was never assigned an id in this turn", _0)]
    UnassignedRequestedSlot(String),
    #[fail(display = "Malformed prompt: {}", _0)]
    MalformedPrompt(String),
    #[fail(display = "Invalid {}: '{}'", _0, _1)]
    InvalidMode(&'static str, String),
    #[fail(display = "Dialogue '{}' has no turn '{}'", _0, _1)]
    UnknownTurn(String, String),
    #[fail(display = "Turn '{}' of dialogue '{}' has no frame '{}'", _1, _0, _2)]
    UnknownFrame(String, String, String),
}

pub type Result<T> = ::std::result::Result<T, ::failure::Error>;
