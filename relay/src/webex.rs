//! WebEx Messages API client and the alarm adaptive card.
//!
//! [`WebexClient::post_alarm`] renders an [`AlarmEvent`] into a fixed
//! adaptive-card layout and posts it to the configured room. The caller gets
//! the HTTP status back; whether it was a success is for the caller to log.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::WebexConfig;

const CARD_CONTENT_TYPE: &str = "application/vnd.microsoft.card.adaptive";
const ALARMS_GUIDE_URL: &str = "https://www.cisco.com/c/en/us/td/docs/unified_computing/Intersight/IMM_Alarms_Guide/b_cisco_intersight_alarms_reference_guide/m_intro_intersight_alarms_guide.html";

/// The alarm fields carried by an Intersight `cond.Alarm` webhook event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AlarmEvent {
    pub affected_mo_display_name: String,
    pub code: String,
    pub create_time: String,
    pub description: String,
}

#[derive(Debug, Error)]
pub enum WebexError {
    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),
    #[error("WebEx request failed: {0}")]
    Request(reqwest::Error),
}

/// Posts messages to a single WebEx room.
#[derive(Clone)]
pub struct WebexClient {
    http: reqwest::Client,
    api_url: String,
    token: String,
    room_id: String,
}

impl WebexClient {
    pub fn new(config: &WebexConfig) -> Result<Self, WebexError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(WebexError::Client)?;
        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            token: config.token.clone(),
            room_id: config.room_id.clone(),
        })
    }

    /// `POST {api_url}` with the alarm card. Returns WebEx's status code.
    pub async fn post_alarm(&self, event: &AlarmEvent) -> Result<StatusCode, WebexError> {
        let resp = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.token)
            .json(&alarm_message(&self.room_id, event))
            .send()
            .await
            .map_err(WebexError::Request)?;
        Ok(resp.status())
    }
}

/// Message body: the card as an attachment, plus a plain-text fallback for
/// clients that can't render cards.
pub fn alarm_message(room_id: &str, event: &AlarmEvent) -> Value {
    json!({
        "roomId": room_id,
        "attachments": [{
            "contentType": CARD_CONTENT_TYPE,
            "content": alarm_card(event),
        }],
        "text": format!("New Critical Alarm: {}", event.code),
    })
}

pub fn alarm_card(event: &AlarmEvent) -> Value {
    let header = json!({
        "type": "ColumnSet",
        "columns": [
            {
                "type": "Column",
                "items": [{
                    "type": "Image",
                    "style": "Person",
                    "url": "https://developer.webex.com/images/webex-logo-icon-non-contained.svg",
                    "size": "Medium",
                    "height": "50px"
                }],
                "width": "auto"
            },
            {
                "type": "Column",
                "items": [
                    {
                        "type": "TextBlock",
                        "text": "Intersight Notification",
                        "weight": "Lighter",
                        "color": "Accent"
                    },
                    {
                        "type": "TextBlock",
                        "weight": "Bolder",
                        "text": "Critical Alarm",
                        "horizontalAlignment": "Left",
                        "wrap": true,
                        "color": "Light",
                        "size": "Large",
                        "spacing": "Small"
                    }
                ],
                "width": "stretch"
            }
        ]
    });

    let facts = json!({
        "type": "ColumnSet",
        "columns": [
            {
                "type": "Column",
                "width": 35,
                "items": [
                    {"type": "TextBlock", "text": "Create Time:", "color": "Light"},
                    {"type": "TextBlock", "text": "AffectedMoDisplayName:", "weight": "Lighter",
                     "color": "Light", "spacing": "Small"},
                    {"type": "TextBlock", "text": "Code:", "weight": "Lighter",
                     "color": "Light", "spacing": "Small"}
                ]
            },
            {
                "type": "Column",
                "width": 65,
                "items": [
                    {"type": "TextBlock", "text": event.create_time, "color": "Light"},
                    {"type": "TextBlock", "text": event.affected_mo_display_name, "color": "Light",
                     "weight": "Lighter", "spacing": "Small"},
                    {"type": "TextBlock", "text": event.code, "weight": "Lighter",
                     "color": "Light", "spacing": "Small"}
                ]
            }
        ],
        "spacing": "Padding",
        "horizontalAlignment": "Center"
    });

    let resources = json!({
        "type": "ColumnSet",
        "columns": [
            {
                "type": "Column",
                "width": "auto",
                "items": [{
                    "type": "Image",
                    "altText": "",
                    "url": "https://developer.webex.com/images/link-icon.png",
                    "size": "Small",
                    "width": "30px"
                }],
                "spacing": "Small"
            },
            {
                "type": "Column",
                "width": "auto",
                "items": [{
                    "type": "TextBlock",
                    "text": format!("[Intersight Alarms Reference Guide]({ALARMS_GUIDE_URL})"),
                    "horizontalAlignment": "Left",
                    "size": "Medium"
                }],
                "verticalContentAlignment": "Center",
                "horizontalAlignment": "Left",
                "spacing": "Small"
            }
        ]
    });

    json!({
        "type": "AdaptiveCard",
        "body": [
            header,
            facts,
            {"type": "TextBlock", "text": event.description, "wrap": true},
            {"type": "TextBlock", "text": "Resources:"},
            resources,
            {
                "type": "ActionSet",
                "actions": [{
                    "type": "Action.Submit",
                    "title": "Subscribe to Release Notes",
                    "data": {"subscribe": true}
                }],
                "horizontalAlignment": "Left",
                "spacing": "None"
            }
        ],
        "$schema": "http://adaptivecards.io/schemas/adaptive-card.json",
        "version": "1.3"
    })
}
