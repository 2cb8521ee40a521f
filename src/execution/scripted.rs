//! Scripted gateway for unit tests

use super::{ExecutionError, ExecutionErrorKind, ExecutionGateway, OrderFill, Side};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

/// Scripted outcome of the next market order
#[derive(Debug, Clone)]
pub enum OrderScript {
    /// Fill this many shares at the given price
    Fill { shares: Decimal, price: Decimal },
    /// Fail with this kind
    Fail(ExecutionErrorKind),
    /// Accept without an order id
    NoOrderId,
}

/// Gateway with settable quotes and queued order outcomes
///
/// Without a queued script, buys fill `amount / ask` shares at the ask and
/// sells fill completely at the bid.
#[derive(Default)]
pub struct ScriptedGateway {
    ask: Mutex<Option<Decimal>>,
    bid: Mutex<Option<Decimal>>,
    asks_after_fill: Mutex<VecDeque<Option<Decimal>>>,
    missing_books: Mutex<HashSet<String>>,
    scripts: Mutex<VecDeque<OrderScript>>,
    orders: Mutex<Vec<(Side, String, Decimal)>>,
}

impl ScriptedGateway {
    pub fn with_quotes(ask: Decimal, bid: Decimal) -> Self {
        let gateway = Self::default();
        gateway.set_ask(Some(ask));
        gateway.set_bid(Some(bid));
        gateway
    }

    pub fn set_ask(&self, ask: Option<Decimal>) {
        *self.ask.lock().unwrap() = ask;
    }

    pub fn set_bid(&self, bid: Option<Decimal>) {
        *self.bid.lock().unwrap() = bid;
    }

    /// Ask returned by the next quote after an order fills
    pub fn push_ask_after_fill(&self, ask: Option<Decimal>) {
        self.asks_after_fill.lock().unwrap().push_back(ask);
    }

    pub fn remove_book(&self, instrument: &str) {
        self.missing_books
            .lock()
            .unwrap()
            .insert(instrument.to_string());
    }

    pub fn push(&self, script: OrderScript) {
        self.scripts.lock().unwrap().push_back(script);
    }

    pub fn orders(&self) -> Vec<(Side, String, Decimal)> {
        self.orders.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExecutionGateway for ScriptedGateway {
    async fn quote_ask(&self, _instrument: &str) -> Option<Decimal> {
        if let Some(ask) = self.asks_after_fill.lock().unwrap().pop_front() {
            return ask;
        }
        *self.ask.lock().unwrap()
    }

    async fn quote_bid(&self, _instrument: &str) -> Option<Decimal> {
        *self.bid.lock().unwrap()
    }

    async fn orderbook_exists(&self, instrument: &str) -> bool {
        !self.missing_books.lock().unwrap().contains(instrument)
    }

    async fn place_market_order(
        &self,
        side: Side,
        instrument: &str,
        amount: Decimal,
    ) -> Result<OrderFill, ExecutionError> {
        self.orders
            .lock()
            .unwrap()
            .push((side, instrument.to_string(), amount));

        let script = self.scripts.lock().unwrap().pop_front();
        let (order_id, shares, price) = match script {
            Some(OrderScript::Fail(kind)) => {
                return Err(ExecutionError::new(kind, "scripted failure"));
            }
            Some(OrderScript::Fill { shares, price }) => ("scripted".to_string(), shares, price),
            Some(OrderScript::NoOrderId) => (String::new(), amount, Decimal::ONE),
            None => {
                let orders = self.orders.lock().unwrap().len();
                match side {
                    Side::Buy => {
                        let ask = self.ask.lock().unwrap().unwrap_or(Decimal::ONE);
                        (format!("order-{}", orders), amount / ask, ask)
                    }
                    Side::Sell => {
                        let bid = self.bid.lock().unwrap().unwrap_or(Decimal::ZERO);
                        (format!("order-{}", orders), amount, bid)
                    }
                }
            }
        };

        Ok(OrderFill {
            order_id,
            side,
            instrument: instrument.to_string(),
            requested_amount: amount,
            filled_amount: shares,
            avg_price: price,
        })
    }
}
