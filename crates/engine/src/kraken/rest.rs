use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256, Sha512};
use tracing::debug;

use common::{
    Balance, Candle, Error, ExchangeClient, Market, MarketRegistry, Order, OrderAck, Position,
    Result, Timeframe,
};

use super::mapping;
use super::model::{self, AddOrderResult, AssetPair, Envelope, OpenPosition, TradeBalance};

const BASE_URL: &str = "https://api.kraken.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// REST client for Kraken spot and margin trading.
pub struct KrakenClient {
    api_key: String,
    /// Decoded API secret.
    secret: Vec<u8>,
    http: Client,
    /// Last nonce handed out; shared by every pipeline using this key.
    last_nonce: AtomicU64,
}

impl KrakenClient {
    /// `secret` is the base64 private key shown by Kraken.
    pub fn new(api_key: impl Into<String>, secret: &str) -> Result<Self> {
        let secret = BASE64
            .decode(secret.trim())
            .map_err(|e| Error::Config(format!("KRAKEN_SECRET is not valid base64: {e}")))?;
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;
        Ok(Self {
            api_key: api_key.into(),
            secret,
            http,
            last_nonce: AtomicU64::new(0),
        })
    }

    /// Millisecond nonce, strictly increasing per key even within one
    /// millisecond.
    fn nonce(&self) -> u64 {
        let now = Utc::now().timestamp_millis().unsigned_abs();
        let next = |last: u64| now.max(last + 1);
        let (Ok(last) | Err(last)) = self
            .last_nonce
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(next(last)));
        next(last)
    }

    async fn public<T: DeserializeOwned>(
        &self,
        method: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{BASE_URL}/0/public/{method}");
        let resp = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;
        Self::read(resp).await
    }

    async fn private<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let path = format!("/0/private/{method}");
        let nonce = self.nonce();
        let mut form = vec![("nonce", nonce.to_string())];
        form.extend(params.iter().cloned());
        let body = serde_urlencoded::to_string(&form)
            .map_err(|e| Error::Other(format!("cannot encode {method} request: {e}")))?;
        let signature = sign(&self.secret, &path, nonce, &body)?;

        let resp = self
            .http
            .post(format!("{BASE_URL}{path}"))
            .header("API-Key", &self.api_key)
            .header("API-Sign", signature)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Http(e.to_string()))?;
        Self::read(resp).await
    }

    async fn read<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        let status = resp.status();
        let text = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::Http(format!("HTTP {status}: {text}")));
        }
        serde_json::from_str::<Envelope<T>>(&text)?.into_result()
    }
}

#[async_trait]
impl ExchangeClient for KrakenClient {
    async fn fetch_candles(&self, market: Market, timeframe: Timeframe) -> Result<Vec<Candle>> {
        let query = [
            ("pair", mapping::pair_code(market).to_string()),
            ("interval", timeframe.minutes().to_string()),
        ];
        let result: HashMap<String, serde_json::Value> = self.public("OHLC", &query).await?;
        model::parse_ohlc(result)
    }

    async fn place_order(&self, order: &Order) -> Result<OrderAck> {
        let params = add_order_params(order);
        debug!(market = %order.market, order_id = %order.id, "Submitting order to Kraken");
        let result: AddOrderResult = self.private("AddOrder", &params).await?;
        Ok(OrderAck {
            order_id: order.id.clone(),
            remote_ids: result.txid,
        })
    }

    async fn fetch_balance(&self) -> Result<Balance> {
        let result: TradeBalance = self.private("TradeBalance", &[]).await?;
        result.into_balance()
    }

    async fn fetch_open_positions(&self, market: Market) -> Result<Vec<Position>> {
        let params = [("docalcs", "true".to_string())];
        let result: HashMap<String, OpenPosition> =
            self.private("OpenPositions", &params).await?;
        model::parse_positions(result, market, self.leverage_for(market))
    }

    async fn fetch_market_metadata(&self, markets: &[Market]) -> Result<MarketRegistry> {
        let pairs = markets
            .iter()
            .map(|m| mapping::pair_code(*m))
            .collect::<Vec<_>>()
            .join(",");
        let result: HashMap<String, AssetPair> =
            self.public("AssetPairs", &[("pair", pairs)]).await?;
        model::parse_asset_pairs(result, markets)
    }

    fn leverage_for(&self, market: Market) -> Decimal {
        mapping::leverage_for(market)
    }
}

/// API-Sign: base64(HMAC-SHA512(path + SHA256(nonce + body), secret)).
pub(crate) fn sign(secret: &[u8], path: &str, nonce: u64, body: &str) -> Result<String> {
    let mut sha = Sha256::new();
    sha.update(nonce.to_string().as_bytes());
    sha.update(body.as_bytes());
    let digest = sha.finalize();

    let mut mac = Hmac::<Sha512>::new_from_slice(secret)
        .map_err(|e| Error::Config(format!("invalid signing key: {e}")))?;
    mac.update(path.as_bytes());
    mac.update(&digest);
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

/// AddOrder parameters. Leverage goes on every leveraged order, closing
/// ones included, so a reduce-only order settles the margin position.
pub(crate) fn add_order_params(order: &Order) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("pair", mapping::pair_code(order.market).to_string()),
        ("type", mapping::side_code(order.side).to_string()),
        ("ordertype", order.price_kind.to_string()),
        ("volume", order.volume.normalize().to_string()),
    ];
    if let Some(price) = order.limit_price {
        params.push(("price", price.normalize().to_string()));
    }
    if order.leverage > Decimal::ONE {
        params.push(("leverage", order.leverage.normalize().to_string()));
    }
    if order.reduce_only {
        params.push(("reduce_only", "true".to_string()));
    }
    if order.post_only {
        params.push(("oflags", "post".to_string()));
    }
    if order.immediate_or_cancel {
        params.push(("timeinforce", "IOC".to_string()));
    }
    params
}
