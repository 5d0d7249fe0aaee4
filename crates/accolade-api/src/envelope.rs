//! The JSON envelope every response is wrapped in.

use axum::http::StatusCode;
use serde::Serialize;

use crate::extract::Json;

/// `{ "success": bool, "data"?: T, "error"?: string, "message"?: string }`
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
  pub success: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data:    Option<T>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error:   Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
}

impl<T> Envelope<T> {
  pub fn data(data: T) -> Self {
    Self { success: true, data: Some(data), error: None, message: None }
  }
}

impl Envelope<()> {
  pub fn message(message: impl Into<String>) -> Self {
    Self { success: true, data: None, error: None, message: Some(message.into()) }
  }

  pub fn failure(error: &str, message: String) -> Self {
    Self {
      success: false,
      data:    None,
      error:   Some(error.to_owned()),
      message: Some(message),
    }
  }
}

pub fn ok<T: Serialize>(data: T) -> Json<Envelope<T>> { Json(Envelope::data(data)) }

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<Envelope<T>>) {
  (StatusCode::CREATED, Json(Envelope::data(data)))
}

pub fn done(message: impl Into<String>) -> Json<Envelope<()>> { Json(Envelope::message(message)) }
