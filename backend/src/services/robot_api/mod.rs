//! Client for the robot automation HTTP API.
//!
//! Every call is a single request to `{address}/{path}?key={credential}`. The
//! client never retries; callers decide whether a failure is worth another tick.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use url::Url;

pub mod types;

use types::{
    AliasCheckData, ChatRoomInfoBody, ChatRoomInfoData, DelayAuthKeyBody, DelayAuthKeyData,
    GenAuthKeyBody, GroupListData, ImageSendItem, MsgItem, QrCodeBody, QrCodeData, RawEnvelope,
    SendMessageBody, TextSendItem, MSG_TYPE_IMAGE, MSG_TYPE_TEXT,
};
pub use types::{
    AliasCheck, AliasCheckItem, ChatRoomInfo, ChatRoomMember, LoginScan, LoginScanData,
    LoginStatus, QrCode, RemoteGroup, SentImage, SentText, TextImageReport,
};

const CODE_OK: i64 = 200;
const CODE_NOT_FOUND: i64 = 300;

const GEN_AUTH_KEY: &str = "admin/GenAuthKey1";
const DELAY_AUTH_KEY: &str = "admin/DelayAuthKey";
const GET_LOGIN_QR_CODE: &str = "login/GetLoginQrCodeNewX";
const CHECK_CAN_SET_ALIAS: &str = "login/CheckCanSetAlias";
const CHECK_LOGIN_STATUS: &str = "login/CheckLoginStatus";
const GET_LOGIN_STATUS: &str = "login/GetLoginStatus";
const GET_INIT_STATUS: &str = "login/GetInItStatus";
const GROUP_LIST: &str = "group/GroupList";
const GET_CHAT_ROOM_INFO: &str = "group/GetChatRoomInfo";
const SEND_TEXT_MESSAGE: &str = "message/SendTextMessage";
const SEND_IMAGE_MESSAGE: &str = "message/SendImageNewMessage";
const HEALTH_PROBE: &str = "health";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid robot address `{address}`")]
    InvalidAddress { address: String },
    /// Connection failure, timeout or an unreadable body.
    #[error("{endpoint}: transport failure: {message}")]
    Transport {
        endpoint: &'static str,
        message: String,
    },
    /// The body was read but is not the JSON shape we expect.
    #[error("{endpoint}: malformed response: {message}")]
    Decode {
        endpoint: &'static str,
        message: String,
    },
    /// The envelope carried a code the endpoint does not accept.
    #[error("{endpoint} returned code {code}: {text}")]
    Application {
        endpoint: &'static str,
        code: i64,
        text: String,
    },
    /// A send call answered 200 but the per-message result reports failure.
    #[error("{endpoint} rejected the message: {reason}")]
    SendRejected {
        endpoint: &'static str,
        reason: String,
    },
}

impl ApiError {
    fn transport(endpoint: &'static str, err: reqwest::Error) -> Self {
        ApiError::Transport {
            endpoint,
            message: err.to_string(),
        }
    }

    fn decode(endpoint: &'static str, err: serde_json::Error) -> Self {
        ApiError::Decode {
            endpoint,
            message: err.to_string(),
        }
    }

    fn rejected(endpoint: &'static str, reason: impl Into<String>) -> Self {
        ApiError::SendRejected {
            endpoint,
            reason: reason.into(),
        }
    }
}

/// Operations exposed by a robot endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RobotApi: Send + Sync {
    /// Mints `count` authorization keys valid for `days`.
    async fn gen_auth_key(
        &self,
        address: &str,
        admin_key: &str,
        count: u32,
        days: u32,
    ) -> Result<Vec<String>, ApiError>;

    async fn get_login_qr_code(
        &self,
        address: &str,
        auth_key: &str,
        check: bool,
        proxy: &str,
    ) -> Result<QrCode, ApiError>;

    /// Risk probe. Code 300 is surfaced as [`AliasCheck::NeedsRelogin`].
    async fn check_can_set_alias(&self, address: &str, token: &str)
        -> Result<AliasCheck, ApiError>;

    /// QR scan progress. Code 300 is surfaced as [`LoginScan::NotFound`].
    async fn check_login_status(&self, address: &str, token: &str)
        -> Result<LoginScan, ApiError>;

    async fn get_login_status(&self, address: &str, token: &str)
        -> Result<LoginStatus, ApiError>;

    /// Whether the session finished loading its contacts upstream.
    async fn get_init_status(&self, address: &str, token: &str) -> Result<bool, ApiError>;

    /// Extends `auth_key` by `days`; returns the new expiry as `YYYY-MM-DD`.
    async fn delay_auth_key(
        &self,
        address: &str,
        admin_key: &str,
        auth_key: &str,
        days: u32,
    ) -> Result<String, ApiError>;

    async fn get_group_list(&self, address: &str, token: &str)
        -> Result<Vec<RemoteGroup>, ApiError>;

    async fn get_chat_room_info(
        &self,
        address: &str,
        token: &str,
        group_ids: &[String],
    ) -> Result<Vec<ChatRoomInfo>, ApiError>;

    async fn send_text(
        &self,
        address: &str,
        token: &str,
        to_user_name: &str,
        text: &str,
    ) -> Result<SentText, ApiError>;

    async fn send_image(
        &self,
        address: &str,
        token: &str,
        to_user_name: &str,
        image_base64: &str,
    ) -> Result<SentImage, ApiError>;

    /// Plain GET on the robot base address; healthy iff HTTP 200.
    async fn check_health(&self, address: &str) -> Result<bool, ApiError>;
}

/// Sends the text part then the image part; either may be absent but not both.
///
/// A failed part does not stop the other one. The report is successful only
/// when every present part went through.
pub async fn send_text_and_image(
    api: &dyn RobotApi,
    address: &str,
    token: &str,
    to_user_name: &str,
    text: Option<&str>,
    image_base64: Option<&str>,
) -> TextImageReport {
    let text = text.filter(|t| !t.is_empty());
    let image = image_base64.filter(|i| !i.is_empty());
    if text.is_none() && image.is_none() {
        return TextImageReport {
            success: false,
            message: "text and image are both empty".to_string(),
        };
    }

    let mut failures = Vec::new();
    if let Some(text) = text {
        if let Err(err) = api.send_text(address, token, to_user_name, text).await {
            tracing::warn!(to_user_name, error = %err, "Text part failed");
            failures.push(format!("text: {err}"));
        }
    }
    if let Some(image) = image {
        if let Err(err) = api.send_image(address, token, to_user_name, image).await {
            tracing::warn!(to_user_name, error = %err, "Image part failed");
            failures.push(format!("image: {err}"));
        }
    }

    if failures.is_empty() {
        TextImageReport {
            success: true,
            message: "sent".to_string(),
        }
    } else {
        TextImageReport {
            success: false,
            message: failures.join("; "),
        }
    }
}

/// Prepends `http://` when the stored address has no scheme.
pub fn normalize_base_url(address: &str) -> String {
    let trimmed = address.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

/// reqwest-backed [`RobotApi`].
#[derive(Debug, Clone)]
pub struct WxApiClient {
    http: Client,
    health_timeout: Duration,
}

impl WxApiClient {
    pub fn new(timeout: Duration, health_timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent("wxbot-backend/1.0")
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            health_timeout,
        })
    }

    fn endpoint_url(&self, address: &str, path: &str, key: &str) -> Result<Url, ApiError> {
        let base = normalize_base_url(address);
        let mut url = Url::parse(&format!("{base}/{path}")).map_err(|_| {
            ApiError::InvalidAddress {
                address: address.to_string(),
            }
        })?;
        url.query_pairs_mut().append_pair("key", key);
        Ok(url)
    }

    async fn get(&self, path: &'static str, address: &str, key: &str) -> Result<RawEnvelope, ApiError> {
        self.send::<()>(Method::GET, path, address, key, None).await
    }

    async fn post<B: Serialize + Sync>(
        &self,
        path: &'static str,
        address: &str,
        key: &str,
        body: &B,
    ) -> Result<RawEnvelope, ApiError> {
        self.send(Method::POST, path, address, key, Some(body)).await
    }

    async fn send<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &'static str,
        address: &str,
        key: &str,
        body: Option<&B>,
    ) -> Result<RawEnvelope, ApiError> {
        let url = self.endpoint_url(address, path, key)?;
        tracing::debug!(method = %method, endpoint = path, address, "Calling robot API");

        let mut request = self
            .http
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::transport(path, e))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::transport(path, e))?;
        tracing::debug!(
            endpoint = path,
            status = status.as_u16(),
            body_length = bytes.len(),
            "Robot API responded"
        );

        serde_json::from_slice::<RawEnvelope>(&bytes).map_err(|e| ApiError::decode(path, e))
    }
}

/// Rejects any code outside `accepted`.
fn accept(path: &'static str, envelope: &RawEnvelope, accepted: &[i64]) -> Result<(), ApiError> {
    if accepted.contains(&envelope.code) {
        return Ok(());
    }
    tracing::warn!(
        endpoint = path,
        code = envelope.code,
        text = %envelope.text,
        "Robot API returned failure code"
    );
    Err(ApiError::Application {
        endpoint: path,
        code: envelope.code,
        text: envelope.text.clone(),
    })
}

/// Decodes `Data`, treating `null` as the type's default.
fn decode_data<T: DeserializeOwned + Default>(
    path: &'static str,
    envelope: RawEnvelope,
) -> Result<T, ApiError> {
    if envelope.data.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(envelope.data).map_err(|e| ApiError::decode(path, e))
}

fn success_data<T: DeserializeOwned + Default>(
    path: &'static str,
    envelope: RawEnvelope,
) -> Result<T, ApiError> {
    accept(path, &envelope, &[CODE_OK])?;
    decode_data(path, envelope)
}

#[async_trait]
impl RobotApi for WxApiClient {
    async fn gen_auth_key(
        &self,
        address: &str,
        admin_key: &str,
        count: u32,
        days: u32,
    ) -> Result<Vec<String>, ApiError> {
        let envelope = self
            .post(GEN_AUTH_KEY, address, admin_key, &GenAuthKeyBody { count, days })
            .await?;
        let keys: Vec<String> = success_data(GEN_AUTH_KEY, envelope)?;
        tracing::info!(count = keys.len(), "Generated authorization keys");
        Ok(keys)
    }

    async fn get_login_qr_code(
        &self,
        address: &str,
        auth_key: &str,
        check: bool,
        proxy: &str,
    ) -> Result<QrCode, ApiError> {
        let envelope = self
            .post(GET_LOGIN_QR_CODE, address, auth_key, &QrCodeBody { check, proxy })
            .await?;
        let data: QrCodeData = success_data(GET_LOGIN_QR_CODE, envelope)?;
        Ok(data.into())
    }

    async fn check_can_set_alias(
        &self,
        address: &str,
        token: &str,
    ) -> Result<AliasCheck, ApiError> {
        let envelope = self.get(CHECK_CAN_SET_ALIAS, address, token).await?;
        accept(CHECK_CAN_SET_ALIAS, &envelope, &[CODE_OK, CODE_NOT_FOUND])?;
        if envelope.code == CODE_NOT_FOUND {
            return Ok(AliasCheck::NeedsRelogin);
        }
        let data: AliasCheckData = decode_data(CHECK_CAN_SET_ALIAS, envelope)?;
        Ok(AliasCheck::Passed(data.results))
    }

    async fn check_login_status(
        &self,
        address: &str,
        token: &str,
    ) -> Result<LoginScan, ApiError> {
        let envelope = self.get(CHECK_LOGIN_STATUS, address, token).await?;
        accept(CHECK_LOGIN_STATUS, &envelope, &[CODE_OK, CODE_NOT_FOUND])?;
        if envelope.code == CODE_NOT_FOUND {
            return Ok(LoginScan::NotFound);
        }
        let data: LoginScanData = decode_data(CHECK_LOGIN_STATUS, envelope)?;
        tracing::info!(wx_id = %data.wx_id, state = data.state, "Checked QR login status");
        Ok(LoginScan::Found(data))
    }

    async fn get_login_status(
        &self,
        address: &str,
        token: &str,
    ) -> Result<LoginStatus, ApiError> {
        let envelope = self.get(GET_LOGIN_STATUS, address, token).await?;
        success_data(GET_LOGIN_STATUS, envelope)
    }

    async fn get_init_status(&self, address: &str, token: &str) -> Result<bool, ApiError> {
        let envelope = self.get(GET_INIT_STATUS, address, token).await?;
        success_data(GET_INIT_STATUS, envelope)
    }

    async fn delay_auth_key(
        &self,
        address: &str,
        admin_key: &str,
        auth_key: &str,
        days: u32,
    ) -> Result<String, ApiError> {
        let body = DelayAuthKeyBody {
            days,
            expiry_date: "",
            key: auth_key,
        };
        let envelope = self.post(DELAY_AUTH_KEY, address, admin_key, &body).await?;
        let data: DelayAuthKeyData = success_data(DELAY_AUTH_KEY, envelope)?;
        tracing::info!(expiry_date = %data.expiry_date, "Extended authorization key");
        Ok(data.expiry_date)
    }

    async fn get_group_list(
        &self,
        address: &str,
        token: &str,
    ) -> Result<Vec<RemoteGroup>, ApiError> {
        let envelope = self.get(GROUP_LIST, address, token).await?;
        let data: GroupListData = success_data(GROUP_LIST, envelope)?;
        Ok(data
            .group_list
            .into_iter()
            .map(|entry| RemoteGroup {
                group_id: entry.user_name.str,
                nick_name: entry.nick_name.str,
            })
            .collect())
    }

    async fn get_chat_room_info(
        &self,
        address: &str,
        token: &str,
        group_ids: &[String],
    ) -> Result<Vec<ChatRoomInfo>, ApiError> {
        let body = ChatRoomInfoBody {
            chat_room_wx_id_list: group_ids,
        };
        let envelope = self.post(GET_CHAT_ROOM_INFO, address, token, &body).await?;
        let data: ChatRoomInfoData = success_data(GET_CHAT_ROOM_INFO, envelope)?;
        Ok(data.contact_list.into_iter().map(ChatRoomInfo::from).collect())
    }

    async fn send_text(
        &self,
        address: &str,
        token: &str,
        to_user_name: &str,
        text: &str,
    ) -> Result<SentText, ApiError> {
        let body = SendMessageBody {
            msg_item: [MsgItem {
                at_wx_id_list: [],
                image_content: "",
                msg_type: MSG_TYPE_TEXT,
                text_content: text,
                to_user_name,
            }],
        };
        tracing::info!(to_user_name, text_length = text.len(), "Sending text message");
        let envelope = self.post(SEND_TEXT_MESSAGE, address, token, &body).await?;
        let items: Vec<TextSendItem> = success_data(SEND_TEXT_MESSAGE, envelope)?;
        check_text_sent(items)
    }

    async fn send_image(
        &self,
        address: &str,
        token: &str,
        to_user_name: &str,
        image_base64: &str,
    ) -> Result<SentImage, ApiError> {
        let body = SendMessageBody {
            msg_item: [MsgItem {
                at_wx_id_list: [],
                image_content: image_base64,
                msg_type: MSG_TYPE_IMAGE,
                text_content: "",
                to_user_name,
            }],
        };
        tracing::info!(to_user_name, image_length = image_base64.len(), "Sending image message");
        let envelope = self.post(SEND_IMAGE_MESSAGE, address, token, &body).await?;
        let items: Vec<ImageSendItem> = success_data(SEND_IMAGE_MESSAGE, envelope)?;
        check_image_sent(items)
    }

    async fn check_health(&self, address: &str) -> Result<bool, ApiError> {
        let base = normalize_base_url(address);
        let url = Url::parse(&base).map_err(|_| ApiError::InvalidAddress {
            address: address.to_string(),
        })?;
        let response = self
            .http
            .get(url)
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(|e| ApiError::transport(HEALTH_PROBE, e))?;
        Ok(response.status() == StatusCode::OK)
    }
}

fn check_text_sent(items: Vec<TextSendItem>) -> Result<SentText, ApiError> {
    let path = SEND_TEXT_MESSAGE;
    let item = items
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::rejected(path, "empty result list"))?;
    if !item.is_send_success {
        return Err(ApiError::rejected(path, "isSendSuccess is false"));
    }
    let resp = item
        .resp
        .ok_or_else(|| ApiError::rejected(path, "missing resp"))?;
    if resp.base_response.ret != 0 {
        return Err(ApiError::rejected(
            path,
            format!("base_response.ret = {}", resp.base_response.ret),
        ));
    }
    let ret = resp
        .chat_send_ret_list
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::rejected(path, "empty chat_send_ret_list"))?;
    if ret.ret != 0 {
        return Err(ApiError::rejected(
            path,
            format!("chat_send_ret_list[0].ret = {}", ret.ret),
        ));
    }
    Ok(SentText {
        to_user_name: ret.to_user_name.str,
        client_msg_id: ret.client_msg_id,
        create_time: ret.create_time,
        new_msg_id: ret.new_msg_id,
    })
}

fn check_image_sent(items: Vec<ImageSendItem>) -> Result<SentImage, ApiError> {
    let path = SEND_IMAGE_MESSAGE;
    let item = items
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::rejected(path, "empty result list"))?;
    if let Some(err_msg) = item.err_msg.filter(|m| !m.is_empty()) {
        return Err(ApiError::rejected(path, err_msg));
    }
    let resp = item
        .resp
        .ok_or_else(|| ApiError::rejected(path, "missing resp"))?;
    if resp.base_response.ret != 0 {
        return Err(ApiError::rejected(
            path,
            format!("baseResponse.ret = {}", resp.base_response.ret),
        ));
    }
    Ok(SentImage {
        msg_id: resp.msg_id,
        from_user_name: resp.from_user_name.str,
        to_user_name: resp.to_user_name.str,
        create_time: resp.create_time,
        new_msg_id: resp.new_msg_id,
    })
}
