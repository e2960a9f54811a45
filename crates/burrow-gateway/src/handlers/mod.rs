mod health;
mod redirect;
mod url;
mod user;

pub use health::ping_handler;
pub use redirect::redirect_handler;
pub use url::{shorten_batch_handler, shorten_json_handler, shorten_text_handler};
pub use user::{delete_user_urls_handler, list_user_urls_handler};
