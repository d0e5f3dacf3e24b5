mod enums;
mod errors;
pub(crate) mod helper_constants;
pub(crate) mod helper_functions;
pub(crate) mod phone_number_regexps_and_mappings;
mod phonenumberutil;

use std::sync::LazyLock;

pub use enums::{MatchType, PhoneNumberFormat, PhoneNumberType, ValidNumberLenType};
pub use errors::{
    ExtractNumberError, GetExampleNumberError, NotANumberError, ParseError, PhoneNumberUtilError,
    ValidationResultErr,
};
pub use phonenumberutil::PhoneNumberUtil;

/// The process-wide engine over the compiled-in metadata. Built on first
/// access; a metadata decode failure is fatal and every later access
/// re-raises it.
pub static PHONE_NUMBER_UTIL: LazyLock<PhoneNumberUtil> = LazyLock::new(PhoneNumberUtil::new);
