#![allow(dead_code)]
use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response, Router};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use tower::ServiceExt;
use wxbot_backend::{
    config::{Config, SchedulerConfig},
    models::{
        bill::{Bill, BillListQuery, BillStat, BillStatsQuery},
        group::{Group, GroupUpsert},
        robot::{join_admin_users, RobotConfig, RobotPayload},
        session::{BotCandidate, SessionDraft, SessionStatus, UserSession},
    },
    repositories::{
        BillRepository, GroupRepository, Repositories, RobotRepository, SessionRepository,
    },
    routes::build_router,
    scheduler::JobContext,
    services::{
        message_strategy::StrategyKind,
        robot_api::{
            AliasCheck, ApiError, ChatRoomInfo, LoginScan, LoginStatus, QrCode, RemoteGroup,
            RobotApi, SentImage, SentText,
        },
    },
    state::AppState,
    types::{BillId, GroupId, RobotId, SessionId},
};

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".into(),
        database_max_connections: 1,
        server_host: "127.0.0.1".into(),
        server_port: 0,
        robot_api_timeout: Duration::from_secs(5),
        robot_health_timeout: Duration::from_secs(1),
        message_strategy: StrategyKind::RoundRobin,
        swagger_enabled: false,
        scheduler: SchedulerConfig {
            enabled: false,
            ..SchedulerConfig::default()
        },
    }
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    robots: Vec<RobotConfig>,
    sessions: Vec<UserSession>,
    groups: Vec<Group>,
    bills: Vec<Bill>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory stand-in for the four Postgres repositories.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    ping_fails: AtomicBool,
    /// Sessions whose group writes fail, keyed by wx_id.
    broken_group_writes: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn repositories(self: &Arc<Self>) -> Repositories {
        Repositories {
            robots: self.clone(),
            sessions: self.clone(),
            groups: self.clone(),
            bills: self.clone(),
        }
    }

    pub fn set_ping_fails(&self, fails: bool) {
        self.ping_fails.store(fails, Ordering::SeqCst);
    }

    pub fn break_group_writes(&self, wx_id: &str) {
        self.broken_group_writes
            .lock()
            .expect("lock")
            .insert(wx_id.to_string());
    }

    pub fn add_robot(&self, address: &str) -> RobotConfig {
        let mut tables = self.tables.lock().expect("lock");
        let now = Utc::now();
        let robot = RobotConfig {
            id: RobotId::new(tables.next_id()),
            address: address.to_string(),
            admin_key: "admin-key".into(),
            owner_id: 1,
            description: String::new(),
            admin_users: String::new(),
            create_time: now,
            update_time: now,
        };
        tables.robots.push(robot.clone());
        robot
    }

    pub fn add_session(&self, robot_id: RobotId, wx_id: &str, token: &str) -> UserSession {
        self.insert_session(SessionDraft {
            robot_id,
            token: token.to_string(),
            wx_id: wx_id.to_string(),
            nick_name: format!("nick-{wx_id}"),
            extension_time: Utc::now() + ChronoDuration::days(365),
            expiration_time: Utc::now() + ChronoDuration::days(365),
            has_security_risk: false,
            status: SessionStatus::Normal,
            is_initialized: false,
            is_message_bot: false,
        })
    }

    pub fn add_initialized_session(
        &self,
        robot_id: RobotId,
        wx_id: &str,
        token: &str,
    ) -> UserSession {
        let session = self.add_session(robot_id, wx_id, token);
        self.with_session(session.id, |s| s.is_initialized = true)
    }

    pub fn add_message_bot(&self, robot_id: RobotId, wx_id: &str, token: &str) -> UserSession {
        let session = self.add_initialized_session(robot_id, wx_id, token);
        self.with_session(session.id, |s| s.is_message_bot = true)
    }

    /// Applies `edit` to a stored session and returns the result.
    pub fn with_session(&self, id: SessionId, edit: impl FnOnce(&mut UserSession)) -> UserSession {
        let mut tables = self.tables.lock().expect("lock");
        let session = tables
            .sessions
            .iter_mut()
            .find(|s| s.id == id)
            .expect("session exists");
        edit(session);
        session.clone()
    }

    pub fn session(&self, id: SessionId) -> UserSession {
        self.tables
            .lock()
            .expect("lock")
            .sessions
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .expect("session exists")
    }

    pub fn add_group(&self, wx_id: &str, group_id: &str, nick_name: &str) -> Group {
        let mut tables = self.tables.lock().expect("lock");
        let now = Utc::now();
        let group = Group {
            id: GroupId::new(tables.next_id()),
            wx_id: wx_id.to_string(),
            group_id: group_id.to_string(),
            group_nick_name: nick_name.to_string(),
            create_time: now,
            update_time: now,
        };
        tables.groups.push(group.clone());
        group
    }

    pub fn groups_of(&self, wx_id: &str) -> Vec<Group> {
        let tables = self.tables.lock().expect("lock");
        let mut groups: Vec<Group> = tables
            .groups
            .iter()
            .filter(|g| g.wx_id == wx_id)
            .cloned()
            .collect();
        groups.sort_by(|a, b| a.group_id.cmp(&b.group_id));
        groups
    }

    pub fn add_bill(&self, owner_id: i64, group_id: &str, amount: &str, msg_time: i64) -> Bill {
        let mut tables = self.tables.lock().expect("lock");
        let now = Utc::now();
        let bill = Bill {
            id: BillId::new(tables.next_id()),
            group_name: format!("group {group_id}"),
            group_id: group_id.to_string(),
            dollar: String::new(),
            rate: String::new(),
            amount: amount.to_string(),
            remark: String::new(),
            operator: "bookkeeper".into(),
            msg_time,
            status: "0".into(),
            owner_id,
            create_time: now,
            update_time: now,
        };
        tables.bills.push(bill.clone());
        bill
    }

    fn insert_session(&self, draft: SessionDraft) -> UserSession {
        let mut tables = self.tables.lock().expect("lock");
        let now = Utc::now();
        let id = SessionId::new(tables.next_id());
        let session = session_from_draft(id, &draft, now, now);
        tables.sessions.push(session.clone());
        session
    }

    fn group_write_broken(&self, wx_id: &str) -> bool {
        self.broken_group_writes
            .lock()
            .expect("lock")
            .contains(wx_id)
    }
}

fn session_from_draft(
    id: SessionId,
    draft: &SessionDraft,
    create_time: DateTime<Utc>,
    update_time: DateTime<Utc>,
) -> UserSession {
    UserSession {
        id,
        robot_id: draft.robot_id,
        token: draft.token.clone(),
        wx_id: draft.wx_id.clone(),
        nick_name: draft.nick_name.clone(),
        extension_time: draft.extension_time,
        expiration_time: draft.expiration_time,
        has_security_risk: draft.has_security_risk,
        status: draft.status,
        is_initialized: draft.is_initialized,
        is_message_bot: draft.is_message_bot,
        create_time,
        update_time,
    }
}

fn page<T: Clone>(rows: &[T], page: i64, page_size: i64) -> Vec<T> {
    let offset = ((page - 1) * page_size) as usize;
    rows.iter()
        .skip(offset)
        .take(page_size as usize)
        .cloned()
        .collect()
}

#[async_trait]
impl RobotRepository for MemoryStore {
    async fn list(&self) -> sqlx::Result<Vec<RobotConfig>> {
        Ok(self.tables.lock().expect("lock").robots.clone())
    }

    async fn find(&self, id: RobotId) -> sqlx::Result<Option<RobotConfig>> {
        let tables = self.tables.lock().expect("lock");
        Ok(tables.robots.iter().find(|r| r.id == id).cloned())
    }

    async fn create(&self, payload: &RobotPayload) -> sqlx::Result<RobotConfig> {
        let mut tables = self.tables.lock().expect("lock");
        let now = Utc::now();
        let robot = RobotConfig {
            id: RobotId::new(tables.next_id()),
            address: payload.address.clone(),
            admin_key: payload.admin_key.clone(),
            owner_id: payload.owner_id,
            description: payload.description.clone(),
            admin_users: join_admin_users(&payload.admin_users),
            create_time: now,
            update_time: now,
        };
        tables.robots.push(robot.clone());
        Ok(robot)
    }

    async fn update(
        &self,
        id: RobotId,
        payload: &RobotPayload,
    ) -> sqlx::Result<Option<RobotConfig>> {
        let mut tables = self.tables.lock().expect("lock");
        let Some(robot) = tables.robots.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };
        robot.address = payload.address.clone();
        robot.admin_key = payload.admin_key.clone();
        robot.owner_id = payload.owner_id;
        robot.description = payload.description.clone();
        robot.admin_users = join_admin_users(&payload.admin_users);
        robot.update_time = Utc::now();
        Ok(Some(robot.clone()))
    }

    async fn ping(&self) -> sqlx::Result<()> {
        if self.ping_fails.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(())
    }
}

#[async_trait]
impl SessionRepository for MemoryStore {
    async fn save(&self, draft: &SessionDraft) -> sqlx::Result<UserSession> {
        let mut tables = self.tables.lock().expect("lock");
        let now = Utc::now();
        if let Some(existing) = tables
            .sessions
            .iter_mut()
            .find(|s| s.robot_id == draft.robot_id && s.wx_id == draft.wx_id)
        {
            *existing = session_from_draft(existing.id, draft, existing.create_time, now);
            return Ok(existing.clone());
        }
        let session = session_from_draft(SessionId::new(tables.next_id()), draft, now, now);
        tables.sessions.push(session.clone());
        Ok(session)
    }

    async fn find(&self, id: SessionId) -> sqlx::Result<Option<UserSession>> {
        let tables = self.tables.lock().expect("lock");
        Ok(tables.sessions.iter().find(|s| s.id == id).cloned())
    }

    async fn list_by_robot(&self, robot_id: RobotId) -> sqlx::Result<Vec<UserSession>> {
        let tables = self.tables.lock().expect("lock");
        Ok(tables
            .sessions
            .iter()
            .filter(|s| s.robot_id == robot_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: SessionId) -> sqlx::Result<bool> {
        let mut tables = self.tables.lock().expect("lock");
        let before = tables.sessions.len();
        tables.sessions.retain(|s| s.id != id);
        Ok(tables.sessions.len() != before)
    }

    async fn update_status(&self, id: SessionId, status: SessionStatus) -> sqlx::Result<bool> {
        Ok(self.edit_session(id, |s| s.status = status))
    }

    async fn mark_initialized(&self, id: SessionId) -> sqlx::Result<bool> {
        Ok(self.edit_session(id, |s| s.is_initialized = true))
    }

    async fn update_message_bot(&self, id: SessionId, is_message_bot: bool) -> sqlx::Result<bool> {
        Ok(self.edit_session(id, |s| s.is_message_bot = is_message_bot))
    }

    async fn update_extension(
        &self,
        robot_id: RobotId,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> sqlx::Result<u64> {
        let mut tables = self.tables.lock().expect("lock");
        let mut updated = 0;
        for session in tables
            .sessions
            .iter_mut()
            .filter(|s| s.robot_id == robot_id && s.token == token)
        {
            session.extension_time = expires_at;
            session.expiration_time = expires_at;
            updated += 1;
        }
        Ok(updated)
    }

    async fn list_uninitialized(&self) -> sqlx::Result<Vec<UserSession>> {
        Ok(self.normal_sessions(|s| !s.is_initialized))
    }

    async fn list_initialized(&self) -> sqlx::Result<Vec<UserSession>> {
        Ok(self.normal_sessions(|s| s.is_initialized))
    }

    async fn list_normal(&self) -> sqlx::Result<Vec<UserSession>> {
        Ok(self.normal_sessions(|_| true))
    }

    async fn find_message_bot_candidates(&self, group_id: &str) -> sqlx::Result<Vec<BotCandidate>> {
        let tables = self.tables.lock().expect("lock");
        let mut candidates: Vec<BotCandidate> = tables
            .sessions
            .iter()
            .filter(|s| s.is_message_bot_eligible())
            .filter(|s| {
                tables
                    .groups
                    .iter()
                    .any(|g| g.wx_id == s.wx_id && g.group_id == group_id)
            })
            .filter_map(|s| {
                let robot = tables.robots.iter().find(|r| r.id == s.robot_id)?;
                Some(BotCandidate {
                    session_id: s.id,
                    robot_id: s.robot_id,
                    token: s.token.clone(),
                    wx_id: s.wx_id.clone(),
                    nick_name: s.nick_name.clone(),
                    robot_address: robot.address.clone(),
                })
            })
            .collect();
        candidates.sort_by_key(|c| c.session_id);
        Ok(candidates)
    }
}

impl MemoryStore {
    fn edit_session(&self, id: SessionId, edit: impl FnOnce(&mut UserSession)) -> bool {
        let mut tables = self.tables.lock().expect("lock");
        match tables.sessions.iter_mut().find(|s| s.id == id) {
            Some(session) => {
                edit(session);
                session.update_time = Utc::now();
                true
            }
            None => false,
        }
    }

    fn normal_sessions(&self, keep: impl Fn(&UserSession) -> bool) -> Vec<UserSession> {
        let tables = self.tables.lock().expect("lock");
        tables
            .sessions
            .iter()
            .filter(|s| s.status == SessionStatus::Normal && keep(s))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl GroupRepository for MemoryStore {
    async fn save_or_update(
        &self,
        wx_id: &str,
        group_id: &str,
        nick_name: &str,
    ) -> sqlx::Result<GroupUpsert> {
        if self.group_write_broken(wx_id) {
            return Err(sqlx::Error::PoolClosed);
        }
        let mut tables = self.tables.lock().expect("lock");
        if let Some(group) = tables
            .groups
            .iter_mut()
            .find(|g| g.wx_id == wx_id && g.group_id == group_id)
        {
            if group.group_nick_name == nick_name {
                return Ok(GroupUpsert::Unchanged);
            }
            group.group_nick_name = nick_name.to_string();
            group.update_time = Utc::now();
            return Ok(GroupUpsert::Renamed);
        }
        let now = Utc::now();
        let group = Group {
            id: GroupId::new(tables.next_id()),
            wx_id: wx_id.to_string(),
            group_id: group_id.to_string(),
            group_nick_name: nick_name.to_string(),
            create_time: now,
            update_time: now,
        };
        tables.groups.push(group);
        Ok(GroupUpsert::Created)
    }

    async fn delete_not_in(&self, wx_id: &str, keep: &[String]) -> sqlx::Result<u64> {
        let mut tables = self.tables.lock().expect("lock");
        let before = tables.groups.len();
        tables
            .groups
            .retain(|g| g.wx_id != wx_id || keep.contains(&g.group_id));
        Ok((before - tables.groups.len()) as u64)
    }

    async fn list_by_wx_id(&self, wx_id: &str) -> sqlx::Result<Vec<Group>> {
        let tables = self.tables.lock().expect("lock");
        Ok(tables
            .groups
            .iter()
            .filter(|g| g.wx_id == wx_id)
            .cloned()
            .collect())
    }

    async fn count_by_wx_id(&self, wx_id: &str) -> sqlx::Result<i64> {
        let tables = self.tables.lock().expect("lock");
        Ok(tables.groups.iter().filter(|g| g.wx_id == wx_id).count() as i64)
    }

    async fn search_by_nick_name(&self, fragment: &str) -> sqlx::Result<Vec<Group>> {
        let tables = self.tables.lock().expect("lock");
        Ok(tables
            .groups
            .iter()
            .filter(|g| g.group_nick_name.contains(fragment))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BillRepository for MemoryStore {
    async fn stats(&self, query: &BillStatsQuery) -> sqlx::Result<(Vec<BillStat>, i64)> {
        let tables = self.tables.lock().expect("lock");
        let mut totals: Vec<BillStat> = Vec::new();
        for bill in tables.bills.iter().filter(|b| b.owner_id == query.owner_id) {
            let cents = parse_cents(&bill.amount);
            match totals.iter_mut().find(|s| s.group_id == bill.group_id) {
                Some(stat) => {
                    let sum = parse_cents(&stat.total_amount) + cents;
                    stat.total_amount = format_cents(sum);
                    stat.count += 1;
                }
                None => totals.push(BillStat {
                    group_id: bill.group_id.clone(),
                    group_nick: bill.group_name.clone(),
                    total_amount: format_cents(cents),
                    count: 1,
                }),
            }
        }
        let total = totals.len() as i64;
        let page_query = query.page();
        Ok((
            page(&totals, page_query.page(), page_query.page_size()),
            total,
        ))
    }

    async fn list(&self, query: &BillListQuery) -> sqlx::Result<(Vec<Bill>, i64)> {
        let tables = self.tables.lock().expect("lock");
        let mut rows: Vec<Bill> = tables
            .bills
            .iter()
            .filter(|b| b.owner_id == query.owner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        let total = rows.len() as i64;
        let page_query = query.page();
        Ok((page(&rows, page_query.page(), page_query.page_size()), total))
    }
}

fn parse_cents(amount: &str) -> i64 {
    let (whole, frac) = amount.split_once('.').unwrap_or((amount, "0"));
    let whole: i64 = whole.parse().unwrap_or(0);
    let frac: i64 = format!("{:0<2}", frac)[..2].parse().unwrap_or(0);
    whole * 100 + frac
}

fn format_cents(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

/// One recorded outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRecord {
    pub kind: &'static str,
    pub address: String,
    pub token: String,
    pub to_user_name: String,
}

#[derive(Default)]
struct Script {
    auth_keys: Vec<String>,
    init_ready: HashSet<String>,
    group_lists: HashMap<String, Vec<RemoteGroup>>,
    alias_checks: HashMap<String, AliasCheck>,
    transport_failures: HashSet<String>,
    application_failures: HashSet<String>,
    image_failures: bool,
    scan: Option<LoginScan>,
    healthy: bool,
    expiry_date: String,
    sent: Vec<SentRecord>,
}

/// Scriptable [`RobotApi`]; every answer is keyed by session token.
#[derive(Default)]
pub struct FakeRobotApi {
    script: Mutex<Script>,
}

impl FakeRobotApi {
    pub fn new() -> Arc<Self> {
        let api = Self::default();
        api.script.lock().expect("lock").healthy = true;
        Arc::new(api)
    }

    pub fn set_auth_keys(&self, keys: &[&str]) {
        self.script.lock().expect("lock").auth_keys = keys.iter().map(|k| k.to_string()).collect();
    }

    pub fn set_init_ready(&self, token: &str) {
        self.script
            .lock()
            .expect("lock")
            .init_ready
            .insert(token.to_string());
    }

    pub fn set_groups(&self, token: &str, groups: &[(&str, &str)]) {
        let groups = groups
            .iter()
            .map(|(id, nick)| RemoteGroup {
                group_id: id.to_string(),
                nick_name: nick.to_string(),
            })
            .collect();
        self.script
            .lock()
            .expect("lock")
            .group_lists
            .insert(token.to_string(), groups);
    }

    pub fn set_alias_check(&self, token: &str, check: AliasCheck) {
        self.script
            .lock()
            .expect("lock")
            .alias_checks
            .insert(token.to_string(), check);
    }

    pub fn fail_transport(&self, token: &str) {
        self.script
            .lock()
            .expect("lock")
            .transport_failures
            .insert(token.to_string());
    }

    pub fn fail_application(&self, token: &str) {
        self.script
            .lock()
            .expect("lock")
            .application_failures
            .insert(token.to_string());
    }

    pub fn fail_images(&self) {
        self.script.lock().expect("lock").image_failures = true;
    }

    pub fn set_scan(&self, scan: LoginScan) {
        self.script.lock().expect("lock").scan = Some(scan);
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.script.lock().expect("lock").healthy = healthy;
    }

    pub fn set_expiry_date(&self, date: &str) {
        self.script.lock().expect("lock").expiry_date = date.to_string();
    }

    pub fn sent(&self) -> Vec<SentRecord> {
        self.script.lock().expect("lock").sent.clone()
    }

    fn guard(&self, endpoint: &'static str, token: &str) -> Result<(), ApiError> {
        let script = self.script.lock().expect("lock");
        if script.transport_failures.contains(token) {
            return Err(ApiError::Transport {
                endpoint,
                message: "connection refused".into(),
            });
        }
        if script.application_failures.contains(token) {
            return Err(ApiError::Application {
                endpoint,
                code: -1,
                text: "session offline".into(),
            });
        }
        Ok(())
    }

    fn record(&self, kind: &'static str, address: &str, token: &str, to_user_name: &str) {
        self.script.lock().expect("lock").sent.push(SentRecord {
            kind,
            address: address.to_string(),
            token: token.to_string(),
            to_user_name: to_user_name.to_string(),
        });
    }
}

#[async_trait]
impl RobotApi for FakeRobotApi {
    async fn gen_auth_key(
        &self,
        _address: &str,
        admin_key: &str,
        _count: u32,
        _days: u32,
    ) -> Result<Vec<String>, ApiError> {
        self.guard("admin/GenAuthKey1", admin_key)?;
        Ok(self.script.lock().expect("lock").auth_keys.clone())
    }

    async fn get_login_qr_code(
        &self,
        _address: &str,
        auth_key: &str,
        _check: bool,
        _proxy: &str,
    ) -> Result<QrCode, ApiError> {
        self.guard("login/GetLoginQrCodeNewX", auth_key)?;
        Ok(QrCode {
            qr_code_url: format!("https://qr.example/{auth_key}"),
            qr_code_base64: "aGVsbG8=".into(),
            uuid: "uuid-1".into(),
            expired_time: 300,
        })
    }

    async fn check_can_set_alias(&self, _address: &str, token: &str) -> Result<AliasCheck, ApiError> {
        self.guard("login/CheckCanSetAlias", token)?;
        let script = self.script.lock().expect("lock");
        Ok(script
            .alias_checks
            .get(token)
            .cloned()
            .unwrap_or(AliasCheck::Passed(Vec::new())))
    }

    async fn check_login_status(&self, _address: &str, token: &str) -> Result<LoginScan, ApiError> {
        self.guard("login/CheckLoginStatus", token)?;
        let script = self.script.lock().expect("lock");
        Ok(script.scan.clone().unwrap_or(LoginScan::NotFound))
    }

    async fn get_login_status(&self, _address: &str, token: &str) -> Result<LoginStatus, ApiError> {
        self.guard("login/GetLoginStatus", token)?;
        Ok(LoginStatus {
            login_state: 1,
            ..LoginStatus::default()
        })
    }

    async fn get_init_status(&self, _address: &str, token: &str) -> Result<bool, ApiError> {
        self.guard("login/GetInItStatus", token)?;
        Ok(self.script.lock().expect("lock").init_ready.contains(token))
    }

    async fn delay_auth_key(
        &self,
        _address: &str,
        admin_key: &str,
        _auth_key: &str,
        _days: u32,
    ) -> Result<String, ApiError> {
        self.guard("admin/DelayAuthKey", admin_key)?;
        Ok(self.script.lock().expect("lock").expiry_date.clone())
    }

    async fn get_group_list(&self, _address: &str, token: &str) -> Result<Vec<RemoteGroup>, ApiError> {
        self.guard("group/GroupList", token)?;
        let script = self.script.lock().expect("lock");
        Ok(script.group_lists.get(token).cloned().unwrap_or_default())
    }

    async fn get_chat_room_info(
        &self,
        _address: &str,
        token: &str,
        _group_ids: &[String],
    ) -> Result<Vec<ChatRoomInfo>, ApiError> {
        self.guard("group/GetChatRoomInfo", token)?;
        Ok(Vec::new())
    }

    async fn send_text(
        &self,
        address: &str,
        token: &str,
        to_user_name: &str,
        _text: &str,
    ) -> Result<SentText, ApiError> {
        self.guard("message/SendTextMessage", token)?;
        self.record("text", address, token, to_user_name);
        Ok(SentText {
            to_user_name: to_user_name.to_string(),
            client_msg_id: 1,
            create_time: 1_700_000_000,
            new_msg_id: 42,
        })
    }

    async fn send_image(
        &self,
        address: &str,
        token: &str,
        to_user_name: &str,
        _image_base64: &str,
    ) -> Result<SentImage, ApiError> {
        self.guard("message/SendImageNewMessage", token)?;
        if self.script.lock().expect("lock").image_failures {
            return Err(ApiError::SendRejected {
                endpoint: "message/SendImageNewMessage",
                reason: "image too large".into(),
            });
        }
        self.record("image", address, token, to_user_name);
        Ok(SentImage {
            msg_id: 7,
            from_user_name: "bot".into(),
            to_user_name: to_user_name.to_string(),
            create_time: 1_700_000_000,
            new_msg_id: 43,
        })
    }

    async fn check_health(&self, _address: &str) -> Result<bool, ApiError> {
        Ok(self.script.lock().expect("lock").healthy)
    }
}

/// Store, fake robot and the router wired over them.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub api: Arc<FakeRobotApi>,
    pub state: AppState,
}

impl TestApp {
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let api = FakeRobotApi::new();
        let robot_api: Arc<dyn RobotApi> = api.clone();
        let state = AppState::new(store.repositories(), robot_api, test_config());
        Self { store, api, state }
    }

    pub fn job_context(&self) -> JobContext {
        let robot_api: Arc<dyn RobotApi> = self.api.clone();
        JobContext::new(self.store.repositories(), robot_api)
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router().oneshot(request).await.expect("response")
    }
}

pub async fn json_body(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}
