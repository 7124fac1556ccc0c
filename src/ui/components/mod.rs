mod command_input;
mod confirm_modal;
mod form_modal;
mod input;
mod key_result;
mod search_input;
mod toast;

pub use command_input::{CommandEvent, CommandInput};
pub use confirm_modal::{ConfirmEvent, ConfirmModal};
pub use form_modal::{FormEvent, FormModal, FormMode};
pub use input::{InputResult, TextInput};
pub use key_result::KeyResult;
pub use search_input::{SearchEvent, SearchInput};
pub use toast::{ToastLevel, Toasts};
