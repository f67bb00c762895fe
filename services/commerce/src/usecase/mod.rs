mod create_order;
mod import_cart;
mod manage_cart;

pub use create_order::{CreateOrderUsKsErr, CreateOrderUseCase};
pub use import_cart::{
    ConfirmCartImportUseCase, ConfirmCartImportUsKsResult, ProcessCartImportUseCase,
    ProcessCartImportUsKsResult, RetrieveImportJobUsKsResult, RetrieveImportJobUseCase,
};
pub use manage_cart::{
    DiscardCartUsKsResult, DiscardCartUseCase, ModifyCartLinesUseCase, ModifyCartUsKsResult,
    RetrieveCartUsKsResult, RetrieveCartUseCase,
};
