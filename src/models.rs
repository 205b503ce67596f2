mod article;
mod descriptor;
mod ids;
mod intent;
mod response;
mod settings;

pub use article::{Article, ArticleBuilder};
pub use descriptor::QueryDescriptor;
pub use ids::SessionId;
pub use intent::IntentLabel;
pub use response::{ResponseKind, ResponseMessage};
pub use settings::{MAX_RETURNS, MIN_RETURNS, Settings, SettingsUpdate};
