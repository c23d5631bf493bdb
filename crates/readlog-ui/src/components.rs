mod confirm_modal;
mod detail_modal;
mod filter_panel;
mod list_page;
mod record_card;
mod record_form;
mod stats_page;
mod toast_stack;

pub use confirm_modal::ConfirmModal;
pub use detail_modal::DetailModal;
pub use filter_panel::FilterPanel;
pub use list_page::ListPage;
pub use record_card::RecordCard;
pub use record_form::RecordForm;
pub use stats_page::StatsPage;
pub use toast_stack::ToastStack;
