//! Wire shapes of the robot automation API and the normalized results the
//! client hands back.
//!
//! Field names follow the upstream JSON exactly; everything is defaulted because
//! upstream omits fields freely on partial failures.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Every endpoint answers `{Code, Data, Text}`; `Data` is decoded only after
/// `Code` has been accepted.
#[derive(Debug, Deserialize)]
pub(crate) struct RawEnvelope {
    #[serde(rename = "Code")]
    pub code: i64,
    #[serde(rename = "Data", default)]
    pub data: Value,
    #[serde(rename = "Text", default)]
    pub text: String,
}

/// Upstream wraps plain strings as `{"str": "..."}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct StrField {
    #[serde(default)]
    pub str: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BaseResponse {
    #[serde(default)]
    pub ret: i64,
}

// Request bodies.

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct GenAuthKeyBody {
    pub count: u32,
    pub days: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct QrCodeBody<'a> {
    pub check: bool,
    pub proxy: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct DelayAuthKeyBody<'a> {
    pub days: u32,
    pub expiry_date: &'a str,
    pub key: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRoomInfoBody<'a> {
    #[serde(rename = "ChatRoomWxIdList")]
    pub chat_room_wx_id_list: &'a [String],
}

#[derive(Debug, Serialize)]
pub(crate) struct SendMessageBody<'a> {
    #[serde(rename = "MsgItem")]
    pub msg_item: [MsgItem<'a>; 1],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct MsgItem<'a> {
    #[serde(rename = "AtWxIDList")]
    pub at_wx_id_list: [&'a str; 0],
    pub image_content: &'a str,
    pub msg_type: u8,
    pub text_content: &'a str,
    pub to_user_name: &'a str,
}

pub(crate) const MSG_TYPE_TEXT: u8 = 1;
pub(crate) const MSG_TYPE_IMAGE: u8 = 3;

// Response payloads.

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QrCodeData {
    #[serde(rename = "QrCodeUrl", default)]
    pub qr_code_url: String,
    #[serde(rename = "qrCodeBase64", default)]
    pub qr_code_base64: String,
    #[serde(default)]
    pub uuid: String,
    #[serde(rename = "expiredTime", default)]
    pub expired_time: i64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AliasCheckData {
    #[serde(default)]
    pub results: Vec<AliasCheckItem>,
}

/// One risk-control probe reported by `CheckCanSetAlias`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasCheckItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub result: String,
    #[serde(rename = "isPass", default)]
    pub is_pass: bool,
}

/// Scan progress reported by `CheckLoginStatus`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LoginScanData {
    #[serde(default)]
    pub uuid: String,
    /// 2 means the QR code was scanned and confirmed.
    #[serde(default)]
    pub state: i64,
    #[serde(rename = "wxid", default)]
    pub wx_id: String,
    #[serde(default)]
    pub nick_name: String,
    #[serde(default)]
    pub head_img_url: String,
}

/// Online detail reported by `GetLoginStatus`, passed through to callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginStatus {
    #[serde(default)]
    pub expiry_time: String,
    #[serde(default)]
    pub login_err_msg: String,
    #[serde(default)]
    pub login_state: i64,
    #[serde(default)]
    pub login_time: String,
    #[serde(default)]
    pub online_days: i64,
    #[serde(default)]
    pub online_time: String,
    #[serde(default)]
    pub proxy_url: String,
    #[serde(default)]
    pub target_ip: String,
    #[serde(default)]
    pub total_online: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DelayAuthKeyData {
    #[serde(rename = "expiryDate", default)]
    pub expiry_date: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GroupListData {
    #[serde(rename = "GroupList", default)]
    pub group_list: Vec<GroupEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GroupEntry {
    #[serde(rename = "userName", default)]
    pub user_name: StrField,
    #[serde(rename = "nickName", default)]
    pub nick_name: StrField,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChatRoomInfoData {
    #[serde(rename = "contactList", default)]
    pub contact_list: Vec<ChatRoomContact>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChatRoomContact {
    #[serde(rename = "userName", default)]
    pub user_name: StrField,
    #[serde(rename = "nickName", default)]
    pub nick_name: StrField,
    #[serde(rename = "chatRoomOwner", default)]
    pub chat_room_owner: String,
    #[serde(rename = "newChatroomData", default)]
    pub new_chatroom_data: ChatRoomMembers,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChatRoomMembers {
    #[serde(default)]
    pub member_count: i64,
    #[serde(default)]
    pub chatroom_member_list: Vec<ChatRoomMemberEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChatRoomMemberEntry {
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub nick_name: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TextSendItem {
    #[serde(rename = "isSendSuccess", default)]
    pub is_send_success: bool,
    #[serde(default)]
    pub resp: Option<TextSendResp>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TextSendResp {
    #[serde(default)]
    pub base_response: BaseResponse,
    #[serde(default)]
    pub chat_send_ret_list: Vec<ChatSendRet>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChatSendRet {
    #[serde(default)]
    pub ret: i64,
    #[serde(rename = "toUserName", default)]
    pub to_user_name: StrField,
    #[serde(rename = "clientMsgId", default)]
    pub client_msg_id: i64,
    #[serde(rename = "createTime", default)]
    pub create_time: i64,
    #[serde(rename = "newMsgId", default)]
    pub new_msg_id: i64,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ImageSendItem {
    #[serde(rename = "errMsg", default)]
    pub err_msg: Option<String>,
    #[serde(default)]
    pub resp: Option<ImageSendResp>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ImageSendResp {
    #[serde(rename = "baseResponse", default)]
    pub base_response: BaseResponse,
    #[serde(rename = "msgId", default)]
    pub msg_id: i64,
    #[serde(rename = "fromUserName", default)]
    pub from_user_name: StrField,
    #[serde(rename = "toUserName", default)]
    pub to_user_name: StrField,
    #[serde(rename = "createTime", default)]
    pub create_time: i64,
    #[serde(rename = "newMsgId", default)]
    pub new_msg_id: i64,
}

// Normalized results.

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct QrCode {
    pub qr_code_url: String,
    pub qr_code_base64: String,
    pub uuid: String,
    pub expired_time: i64,
}

impl From<QrCodeData> for QrCode {
    fn from(data: QrCodeData) -> Self {
        Self {
            qr_code_url: data.qr_code_url,
            qr_code_base64: data.qr_code_base64,
            uuid: data.uuid,
            expired_time: data.expired_time,
        }
    }
}

/// Outcome of `CheckCanSetAlias`: code 200 carries the probe results, code 300
/// means the upstream session is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasCheck {
    Passed(Vec<AliasCheckItem>),
    NeedsRelogin,
}

impl AliasCheck {
    /// True when any probe failed. A relogin answer carries no risk signal.
    pub fn has_security_risk(&self) -> bool {
        match self {
            AliasCheck::Passed(items) => items.iter().any(|item| !item.is_pass),
            AliasCheck::NeedsRelogin => false,
        }
    }
}

/// Outcome of `CheckLoginStatus`: code 300 means the QR session does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginScan {
    Found(LoginScanData),
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteGroup {
    pub group_id: String,
    pub nick_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ChatRoomInfo {
    pub group_id: String,
    pub nick_name: String,
    pub owner: String,
    pub member_count: i64,
    pub members: Vec<ChatRoomMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ChatRoomMember {
    pub wx_id: String,
    pub nick_name: String,
}

impl From<ChatRoomContact> for ChatRoomInfo {
    fn from(contact: ChatRoomContact) -> Self {
        Self {
            group_id: contact.user_name.str,
            nick_name: contact.nick_name.str,
            owner: contact.chat_room_owner,
            member_count: contact.new_chatroom_data.member_count,
            members: contact
                .new_chatroom_data
                .chatroom_member_list
                .into_iter()
                .map(|member| ChatRoomMember {
                    wx_id: member.user_name,
                    nick_name: member.nick_name,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SentText {
    pub to_user_name: String,
    pub client_msg_id: i64,
    pub create_time: i64,
    pub new_msg_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SentImage {
    pub msg_id: i64,
    pub from_user_name: String,
    pub to_user_name: String,
    pub create_time: i64,
    pub new_msg_id: i64,
}

/// Aggregate result of a text-plus-image send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TextImageReport {
    pub success: bool,
    pub message: String,
}
