use http::header::HeaderName;

/// Client IP forwarded to Criteo.
pub const HEADER_X_CLIENT_IP: HeaderName = HeaderName::from_static("x-client-ip");
