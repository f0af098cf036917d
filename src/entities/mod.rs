pub mod contact;
pub mod delivery_tracking;
pub mod order;
pub mod order_item;
pub mod payment_event;
pub mod product_variant;

pub use contact::Entity as Contact;
pub use delivery_tracking::Entity as DeliveryTracking;
pub use order::Entity as Order;
pub use order_item::Entity as OrderItem;
pub use payment_event::Entity as PaymentEvent;
pub use product_variant::Entity as ProductVariant;
