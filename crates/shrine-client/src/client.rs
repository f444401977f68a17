//! HTTP client for the storefront REST API.
//!
//! Wraps `reqwest` with bearer-token injection from [`LocalState`], status
//! mapping into [`ClientError`], and normalisation of the loosely-shaped
//! JSON the backend returns. Nothing here retries: failures go straight
//! back to the caller.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use shrine_core::{AppConfig, CartLine, CartPayload, Coupon, LocalState, Product, Session};

use crate::error::ClientError;
use crate::types::{
    error_message, AddToCartRequest, LoginRequest, ProductListPayload, RegisterRequest,
    WishlistRequest,
};

/// Client for the storefront REST API.
///
/// Authenticated calls read the bearer token from the shared [`LocalState`]
/// at request time, so a login or logout elsewhere takes effect on the next
/// call.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    state: LocalState,
}

impl ApiClient {
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ClientError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        state: LocalState,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        // A trailing slash makes `Url::join` append to the base path instead
        // of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let parsed = Url::parse(&normalised).map_err(|e| ClientError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ClientError::InvalidBaseUrl {
                base_url: base_url.to_owned(),
                reason: "URL cannot be used as a base".to_owned(),
            });
        }

        Ok(Self {
            client,
            base_url: parsed,
            state,
        })
    }

    /// # Errors
    ///
    /// Same as [`ApiClient::new`].
    pub fn from_config(config: &AppConfig, state: LocalState) -> Result<Self, ClientError> {
        Self::new(
            &config.api_url,
            config.request_timeout_secs,
            &config.user_agent,
            state,
        )
    }

    #[must_use]
    pub fn state(&self) -> &LocalState {
        &self.state
    }

    /// Signs in and returns the session. Does not persist it.
    ///
    /// # Errors
    ///
    /// - [`ClientError::InvalidCredentials`] for rejected credentials.
    /// - [`ClientError::UnexpectedStatus`] for other non-2xx answers.
    /// - [`ClientError::Http`] / [`ClientError::Deserialize`] on transport or
    ///   decoding failure.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let url = self.endpoint("api/users/login")?;
        let request = self
            .client
            .post(url)
            .json(&LoginRequest { email, password });
        Self::send_json(request, "login")
            .await
            .map_err(credentials_rejected)
    }

    /// Creates an account and returns its session. Does not persist it.
    ///
    /// # Errors
    ///
    /// As for [`ApiClient::login`].
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, ClientError> {
        let url = self.endpoint("api/users/register")?;
        let request = self.client.post(url).json(&RegisterRequest {
            name,
            email,
            password,
        });
        Self::send_json(request, "register")
            .await
            .map_err(credentials_rejected)
    }

    /// `POST /api/cart`: adds or increments one server cart line.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotAuthenticated`] without a stored session and
    /// [`ClientError::Unauthorized`] when the server rejects it, otherwise
    /// as for [`ApiClient::login`].
    pub async fn add_to_cart(&self, product_id: &str, quantity: u32) -> Result<(), ClientError> {
        let url = self.endpoint("api/cart")?;
        let request = self.authed(self.client.post(url))?.json(&AddToCartRequest {
            product_id,
            quantity,
        });
        Self::send(request).await?;
        Ok(())
    }

    /// `GET /api/cart`, normalised to sanitised lines whichever shape the
    /// server used.
    ///
    /// # Errors
    ///
    /// As for [`ApiClient::add_to_cart`].
    pub async fn fetch_cart(&self) -> Result<Vec<CartLine>, ClientError> {
        let url = self.endpoint("api/cart")?;
        let request = self.authed(self.client.get(url))?;
        let payload: CartPayload = Self::send_json(request, "fetch cart").await?;
        Ok(payload.into_lines())
    }

    /// `GET /api/users/wishlist`. Entries that are not products are skipped.
    ///
    /// # Errors
    ///
    /// As for [`ApiClient::add_to_cart`].
    pub async fn fetch_wishlist(&self) -> Result<Vec<Product>, ClientError> {
        let url = self.endpoint("api/users/wishlist")?;
        let request = self.authed(self.client.get(url))?;
        let values: Vec<Value> = Self::send_json(request, "fetch wishlist").await?;
        Ok(decode_products(values))
    }

    /// `POST /api/users/wishlist`.
    ///
    /// # Errors
    ///
    /// As for [`ApiClient::add_to_cart`].
    pub async fn add_to_wishlist(&self, product_id: &str) -> Result<(), ClientError> {
        let url = self.endpoint("api/users/wishlist")?;
        let request = self
            .authed(self.client.post(url))?
            .json(&WishlistRequest { product_id });
        Self::send(request).await?;
        Ok(())
    }

    /// `GET /api/products`.
    ///
    /// # Errors
    ///
    /// As for [`ApiClient::login`].
    pub async fn list_products(&self) -> Result<Vec<Product>, ClientError> {
        let url = self.endpoint("api/products")?;
        let payload: ProductListPayload =
            Self::send_json(self.client.get(url), "list products").await?;
        Ok(decode_products(payload.into_values()))
    }

    /// `GET /api/products/{id}`.
    ///
    /// # Errors
    ///
    /// As for [`ApiClient::login`]; a missing product is
    /// [`ClientError::UnexpectedStatus`] with status 404.
    pub async fn get_product(&self, id: &str) -> Result<Product, ClientError> {
        let mut url = self.endpoint("api/products")?;
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: "URL cannot be used as a base".to_owned(),
            })?
            .push(id);
        Self::send_json(self.client.get(url), &format!("get product {id}"))
            .await
    }

    /// `GET /api/coupons/active`.
    ///
    /// # Errors
    ///
    /// As for [`ApiClient::login`].
    pub async fn active_coupons(&self) -> Result<Vec<Coupon>, ClientError> {
        let url = self.endpoint("api/coupons/active")?;
        Self::send_json(self.client.get(url), "active coupons").await
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base_url
            .join(path)
            .map_err(|e| ClientError::InvalidBaseUrl {
                base_url: self.base_url.to_string(),
                reason: e.to_string(),
            })
    }

    /// Attaches the stored bearer token.
    fn authed(&self, request: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let token = self.state.token().ok_or(ClientError::NotAuthenticated)?;
        Ok(request.bearer_auth(token))
    }

    /// Sends `request` and maps non-2xx statuses to errors.
    async fn send(request: RequestBuilder) -> Result<Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().to_string();
        tracing::debug!(%url, status = status.as_u16(), "api response");

        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized { url });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::UnexpectedStatus {
                status: status.as_u16(),
                url,
                message: error_message(&body),
            });
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(
        request: RequestBuilder,
        context: &str,
    ) -> Result<T, ClientError> {
        let response = Self::send(request).await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|source| ClientError::Deserialize {
            context: context.to_owned(),
            source,
        })
    }
}

/// A 401 from a sign-in endpoint is about the credentials, not a session.
fn credentials_rejected(err: ClientError) -> ClientError {
    match err {
        ClientError::Unauthorized { .. } => ClientError::InvalidCredentials,
        other => other,
    }
}

fn decode_products(values: Vec<Value>) -> Vec<Product> {
    let total = values.len();
    let products: Vec<Product> = values
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect();
    if products.len() < total {
        tracing::debug!(
            skipped = total - products.len(),
            "skipped product entries that did not decode"
        );
    }
    products
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
