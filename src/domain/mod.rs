pub mod member;
pub mod member_id;
pub mod activity;
pub mod content;
pub mod outreach;
pub mod points;

pub use member::*;
pub use activity::*;
pub use content::*;
pub use outreach::*;
pub use points::*;
