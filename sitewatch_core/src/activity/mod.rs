mod display;
mod record;
mod seed;
mod store;
mod time;

pub use display::{render_lines, ActivityStyle, ActivityView, Tone};
pub use record::{
    ActivityId, ActivityRecord, ActivityTime, Icon, Severity, DEFAULT_KIND, DEFAULT_MESSAGE,
};
pub use seed::historical_sample;
pub use store::{ActivityLog, DEFAULT_CAPACITY};
pub use time::{format_millis, now_millis};
