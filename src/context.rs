//! Request context passed into the detection pipeline.
//!
//! Adapters at the transport boundary translate host-framework request
//! objects into this shape; the pipeline never sees framework types.

use std::collections::HashMap;

/// Server-observable request metadata.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Request headers, lowercase keys, first value per header
    pub headers: HashMap<String, String>,
    /// Parsed request cookies
    pub cookies: HashMap<String, String>,
    /// HTTP method
    pub method: String,
    /// Request path
    pub path: String,
    /// Transport-level remote address, if known
    pub remote_addr: Option<String>,
}

impl RequestContext {
    /// Start building a request context.
    pub fn builder() -> RequestContextBuilder {
        RequestContextBuilder::default()
    }

    /// Get a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|s| s.as_str())
    }

    /// Get the User-Agent header.
    pub fn user_agent(&self) -> Option<&str> {
        self.header("user-agent")
    }

    /// Get a cookie value by name.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(|s| s.as_str())
    }

    /// Client IP for rate-limit keying: first `x-forwarded-for` entry if
    /// present, else the remote address, else `"unknown"`.
    pub fn client_ip(&self) -> &str {
        if let Some(xff) = self.header("x-forwarded-for") {
            if let Some(first) = xff.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return first;
                }
            }
        }
        self.remote_addr.as_deref().unwrap_or("unknown")
    }
}

/// Builder for [`RequestContext`].
#[derive(Debug, Default)]
pub struct RequestContextBuilder {
    ctx: RequestContext,
}

impl RequestContextBuilder {
    /// Add a header; the name is lowercased.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.ctx.headers.insert(name.to_lowercase(), value.into());
        self
    }

    /// Add a cookie.
    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.ctx.cookies.insert(name.into(), value.into());
        self
    }

    /// Set the HTTP method.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.ctx.method = method.into();
        self
    }

    /// Set the request path.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.ctx.path = path.into();
        self
    }

    /// Set the transport-level remote address.
    pub fn remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.ctx.remote_addr = Some(addr.into());
        self
    }

    /// Finish building.
    pub fn build(self) -> RequestContext {
        self.ctx
    }
}
