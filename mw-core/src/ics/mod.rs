//! iCalendar import.
//!
//! Calendar files are converted into native grammar text and written next
//! to the input; they are never rendered directly.

mod convert;

pub use convert::{
    CALENDAR_EXTENSIONS, NATIVE_EXTENSION, convert_calendar, convert_file, is_calendar_path,
    native_path_for,
};
