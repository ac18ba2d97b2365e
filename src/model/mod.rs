//! Domain types shared by the actors, the clients and the wire boundary.

pub mod cart;
pub mod event;
pub mod history;
pub mod line;
pub mod price;
pub mod reply;
pub mod server;

pub use cart::{Cart, CartCreate, CartId, CartSummary, CartUpdate, DeliveryInfo, DeliveryUpdate};
pub use event::{Notice, NoticeLevel, StoreEvent};
pub use history::LineHistory;
pub use line::{parse_stock, CartItem, LineId, LineOverlay, NewCartItem, OfferIdentity, RemoteLine};
pub use price::{PriceChange, PriceChangeSummary, RemotePriceChange};
pub use reply::{MutationReply, PriceUpdateReply, RemoteCart};
pub use server::{PriceBookUpdate, ServerCart, ServerCartCreate};
