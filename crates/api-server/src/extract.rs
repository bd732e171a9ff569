//! Extractors whose rejections go through [`AppError`], so malformed bodies
//! and query strings still answer with the JSON envelope.

use axum::extract::{FromRequest, FromRequestParts};

use crate::AppError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);
