use chrono::Utc;
use rust_decimal::Decimal;

use common::precision::{normalize_volume, percentage};
use common::{
    Balance, MarketMetadata, Order, OrderKind, OrderSide, OrderStatus, Position, PriceKind,
};

use crate::StrategyContext;

/// A new margin market order at the context's leverage.
pub fn build_open_order(
    ctx: &StrategyContext,
    side: OrderSide,
    volume: Decimal,
    price: Decimal,
) -> Order {
    Order {
        id: uuid::Uuid::new_v4().to_string(),
        remote_id: None,
        side,
        kind: OrderKind::Margin,
        price_kind: PriceKind::Market,
        volume,
        limit_price: None,
        market_price: price,
        market: ctx.market,
        status: OrderStatus::Created,
        leverage: ctx.leverage,
        reduce_only: false,
        immediate_or_cancel: false,
        post_only: false,
        created_at: Utc::now(),
    }
}

/// A reduce-only market order on the opposite side, sized to the whole position.
pub fn build_closing_order(position: &Position, leverage: Decimal, price: Decimal) -> Order {
    Order {
        id: uuid::Uuid::new_v4().to_string(),
        remote_id: None,
        side: position.side.opposite(),
        kind: OrderKind::Spot,
        price_kind: PriceKind::Market,
        volume: position.size,
        limit_price: None,
        market_price: price,
        market: position.market,
        status: OrderStatus::Created,
        leverage,
        reduce_only: true,
        immediate_or_cancel: false,
        post_only: false,
        created_at: Utc::now(),
    }
}

/// Volume bought by committing `fraction_pct` percent of free margin at
/// `leverage`, truncated to the market precision. `None` for a non-positive
/// price or nothing to commit.
pub fn entry_volume(
    balance: &Balance,
    fraction_pct: Decimal,
    leverage: Decimal,
    price: Decimal,
    precision: u32,
) -> Option<Decimal> {
    if price <= Decimal::ZERO {
        return None;
    }
    let margin = percentage(balance.free_margin, fraction_pct);
    let volume = normalize_volume(margin * leverage.max(Decimal::ONE) / price, precision);
    (volume > Decimal::ZERO).then_some(volume)
}

/// Market cost reaches the minimum order cost.
pub fn check_cost(order: &Order, metadata: &MarketMetadata) -> bool {
    order.market_cost() >= metadata.min_cost
}

/// Volume reaches the minimum order volume.
pub fn check_volume(order: &Order, metadata: &MarketMetadata) -> bool {
    order.volume >= metadata.min_volume
}

pub fn meets_minimums(order: &Order, metadata: &MarketMetadata) -> bool {
    check_cost(order, metadata) && check_volume(order, metadata)
}
