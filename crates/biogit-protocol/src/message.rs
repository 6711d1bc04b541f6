//! Typed messages and their wire encoding.

use bstr::{BString, ByteSlice};
use biogit_hash::ObjectId;

use crate::frame::RawFrame;
use crate::ProtocolError;

/// Message ids. Requests live in the 2xxx range, responses in 3xxx.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum MsgId {
    // Repository operations (authenticated).
    ListRefs = 2001,
    GetObject = 2002,
    CheckObjects = 2003,
    PutObject = 2004,
    UpdateRef = 2005,
    // Session setup (authenticated).
    TargetRepo = 2010,
    // Account operations.
    RegisterUser = 2020,
    LoginUser = 2021,

    // Responses.
    AckOk = 3000,
    Error = 3001,
    AuthRequired = 3002,
    RefsListBegin = 3010,
    RefsEntry = 3011,
    RefsListEnd = 3012,
    ObjectContent = 3020,
    ObjectNotFound = 3021,
    CheckObjectsResult = 3030,
    RefUpdated = 3040,
    RefUpdateDenied = 3041,
    TargetRepoAck = 3050,
    TargetRepoError = 3051,
    RegisterOk = 3060,
    LoginOk = 3061,
}

impl MsgId {
    /// Parse a wire id.
    pub fn from_u16(id: u16) -> Result<Self, ProtocolError> {
        Ok(match id {
            2001 => Self::ListRefs,
            2002 => Self::GetObject,
            2003 => Self::CheckObjects,
            2004 => Self::PutObject,
            2005 => Self::UpdateRef,
            2010 => Self::TargetRepo,
            2020 => Self::RegisterUser,
            2021 => Self::LoginUser,
            3000 => Self::AckOk,
            3001 => Self::Error,
            3002 => Self::AuthRequired,
            3010 => Self::RefsListBegin,
            3011 => Self::RefsEntry,
            3012 => Self::RefsListEnd,
            3020 => Self::ObjectContent,
            3021 => Self::ObjectNotFound,
            3030 => Self::CheckObjectsResult,
            3040 => Self::RefUpdated,
            3041 => Self::RefUpdateDenied,
            3050 => Self::TargetRepoAck,
            3051 => Self::TargetRepoError,
            3060 => Self::RegisterOk,
            3061 => Self::LoginOk,
            other => return Err(ProtocolError::UnknownMessageId(other)),
        })
    }

    /// Does this request require a token prefix in the body?
    pub fn requires_token(&self) -> bool {
        matches!(
            self,
            Self::ListRefs
                | Self::GetObject
                | Self::CheckObjects
                | Self::PutObject
                | Self::UpdateRef
                | Self::TargetRepo
        )
    }
}

/// The value a listed ref carries: a direct hash, or (for symbolic `HEAD`)
/// the branch it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefValue {
    Direct(ObjectId),
    Symbolic(String),
}

impl RefValue {
    fn encode(&self) -> String {
        match self {
            RefValue::Direct(oid) => oid.to_hex(),
            RefValue::Symbolic(target) => format!("ref: {target}"),
        }
    }

    fn decode(s: &str) -> Result<Self, ProtocolError> {
        if let Some(target) = s.strip_prefix("ref: ") {
            Ok(RefValue::Symbolic(target.to_string()))
        } else {
            Ok(RefValue::Direct(ObjectId::from_hex(s)?))
        }
    }
}

/// A fully decoded protocol message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Requests.
    RegisterUser { username: String, password: String },
    LoginUser { username: String, password: String },
    TargetRepo { token: String, path: String },
    ListRefs { token: String },
    GetObject { token: String, oid: ObjectId },
    CheckObjects { token: String, oids: Vec<ObjectId> },
    PutObject { token: String, oid: ObjectId, data: Vec<u8> },
    UpdateRef {
        token: String,
        force: bool,
        name: String,
        new: ObjectId,
        expected_old: Option<ObjectId>,
    },

    // Responses.
    AckOk,
    Error(String),
    AuthRequired,
    RefsListBegin,
    RefsEntry { name: String, value: RefValue },
    RefsListEnd,
    ObjectContent { oid: ObjectId, data: Vec<u8> },
    ObjectNotFound(ObjectId),
    CheckObjectsResult(Vec<bool>),
    RefUpdated,
    RefUpdateDenied(String),
    TargetRepoAck,
    TargetRepoError(String),
    RegisterOk,
    LoginOk(String),
}

impl Message {
    /// The wire id of this message.
    pub fn id(&self) -> MsgId {
        match self {
            Message::RegisterUser { .. } => MsgId::RegisterUser,
            Message::LoginUser { .. } => MsgId::LoginUser,
            Message::TargetRepo { .. } => MsgId::TargetRepo,
            Message::ListRefs { .. } => MsgId::ListRefs,
            Message::GetObject { .. } => MsgId::GetObject,
            Message::CheckObjects { .. } => MsgId::CheckObjects,
            Message::PutObject { .. } => MsgId::PutObject,
            Message::UpdateRef { .. } => MsgId::UpdateRef,
            Message::AckOk => MsgId::AckOk,
            Message::Error(_) => MsgId::Error,
            Message::AuthRequired => MsgId::AuthRequired,
            Message::RefsListBegin => MsgId::RefsListBegin,
            Message::RefsEntry { .. } => MsgId::RefsEntry,
            Message::RefsListEnd => MsgId::RefsListEnd,
            Message::ObjectContent { .. } => MsgId::ObjectContent,
            Message::ObjectNotFound(_) => MsgId::ObjectNotFound,
            Message::CheckObjectsResult(_) => MsgId::CheckObjectsResult,
            Message::RefUpdated => MsgId::RefUpdated,
            Message::RefUpdateDenied(_) => MsgId::RefUpdateDenied,
            Message::TargetRepoAck => MsgId::TargetRepoAck,
            Message::TargetRepoError(_) => MsgId::TargetRepoError,
            Message::RegisterOk => MsgId::RegisterOk,
            Message::LoginOk(_) => MsgId::LoginOk,
        }
    }

    /// Encode into a raw frame.
    pub fn encode(&self) -> RawFrame {
        let mut body = Vec::new();
        match self {
            Message::RegisterUser { username, password }
            | Message::LoginUser { username, password } => {
                push_nul_str(&mut body, username);
                push_nul_str(&mut body, password);
            }
            Message::TargetRepo { token, path } => {
                push_nul_str(&mut body, token);
                push_nul_str(&mut body, path);
            }
            Message::ListRefs { token } => {
                push_nul_str(&mut body, token);
            }
            Message::GetObject { token, oid } => {
                push_nul_str(&mut body, token);
                body.extend_from_slice(oid.to_hex().as_bytes());
            }
            Message::CheckObjects { token, oids } => {
                push_nul_str(&mut body, token);
                body.extend_from_slice(&(oids.len() as u32).to_be_bytes());
                for oid in oids {
                    body.extend_from_slice(oid.to_hex().as_bytes());
                }
            }
            Message::PutObject { token, oid, data } => {
                push_nul_str(&mut body, token);
                body.extend_from_slice(oid.to_hex().as_bytes());
                body.extend_from_slice(data);
            }
            Message::UpdateRef {
                token,
                force,
                name,
                new,
                expected_old,
            } => {
                push_nul_str(&mut body, token);
                body.push(u8::from(*force));
                push_nul_str(&mut body, name);
                body.extend_from_slice(new.to_hex().as_bytes());
                if let Some(old) = expected_old {
                    body.extend_from_slice(old.to_hex().as_bytes());
                }
            }
            Message::Error(reason) => body.extend_from_slice(reason.as_bytes()),
            Message::RefsEntry { name, value } => {
                push_nul_str(&mut body, name);
                push_nul_str(&mut body, &value.encode());
            }
            Message::ObjectContent { oid, data } => {
                body.extend_from_slice(oid.to_hex().as_bytes());
                body.extend_from_slice(data);
            }
            Message::ObjectNotFound(oid) => body.extend_from_slice(oid.to_hex().as_bytes()),
            Message::CheckObjectsResult(present) => {
                body.extend_from_slice(&(present.len() as u32).to_be_bytes());
                body.extend(present.iter().map(|&p| u8::from(p)));
            }
            Message::RefUpdateDenied(reason) | Message::TargetRepoError(reason) => {
                push_nul_str(&mut body, reason);
            }
            Message::LoginOk(token) => body.extend_from_slice(token.as_bytes()),
            Message::AckOk
            | Message::AuthRequired
            | Message::RefsListBegin
            | Message::RefsListEnd
            | Message::RefUpdated
            | Message::TargetRepoAck
            | Message::RegisterOk => {}
        }
        RawFrame {
            id: self.id() as u16,
            body,
        }
    }

    /// Decode a raw frame into a typed message.
    pub fn decode(frame: &RawFrame) -> Result<Self, ProtocolError> {
        let id = MsgId::from_u16(frame.id)?;
        let mut p = Parser::new(&frame.body, id);

        let message = match id {
            MsgId::RegisterUser => Message::RegisterUser {
                username: p.nul_str()?,
                password: p.nul_str()?,
            },
            MsgId::LoginUser => Message::LoginUser {
                username: p.nul_str()?,
                password: p.nul_str()?,
            },
            MsgId::TargetRepo => Message::TargetRepo {
                token: p.nul_str()?,
                path: p.nul_str()?,
            },
            MsgId::ListRefs => Message::ListRefs { token: p.nul_str()? },
            MsgId::GetObject => Message::GetObject {
                token: p.nul_str()?,
                oid: p.oid()?,
            },
            MsgId::CheckObjects => {
                let token = p.nul_str()?;
                let count = p.u32()?;
                let mut oids = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    oids.push(p.oid()?);
                }
                Message::CheckObjects { token, oids }
            }
            MsgId::PutObject => Message::PutObject {
                token: p.nul_str()?,
                oid: p.oid()?,
                data: p.rest(),
            },
            MsgId::UpdateRef => {
                let token = p.nul_str()?;
                let force = p.u8()? != 0;
                let name = p.nul_str()?;
                let new = p.oid()?;
                let expected_old = if p.is_empty() { None } else { Some(p.oid()?) };
                Message::UpdateRef {
                    token,
                    force,
                    name,
                    new,
                    expected_old,
                }
            }
            MsgId::AckOk => Message::AckOk,
            MsgId::Error => Message::Error(p.rest_str()?),
            MsgId::AuthRequired => Message::AuthRequired,
            MsgId::RefsListBegin => Message::RefsListBegin,
            MsgId::RefsEntry => {
                let name = p.nul_str()?;
                let value = RefValue::decode(&p.nul_str()?)?;
                Message::RefsEntry { name, value }
            }
            MsgId::RefsListEnd => Message::RefsListEnd,
            MsgId::ObjectContent => Message::ObjectContent {
                oid: p.oid()?,
                data: p.rest(),
            },
            MsgId::ObjectNotFound => Message::ObjectNotFound(p.oid()?),
            MsgId::CheckObjectsResult => {
                let count = p.u32()?;
                let bytes = p.take(count as usize)?;
                Message::CheckObjectsResult(bytes.iter().map(|&b| b != 0).collect())
            }
            MsgId::RefUpdated => Message::RefUpdated,
            MsgId::RefUpdateDenied => Message::RefUpdateDenied(p.nul_str()?),
            MsgId::TargetRepoAck => Message::TargetRepoAck,
            MsgId::TargetRepoError => Message::TargetRepoError(p.nul_str()?),
            MsgId::RegisterOk => Message::RegisterOk,
            MsgId::LoginOk => Message::LoginOk(p.rest_str()?),
        };

        Ok(message)
    }
}

fn push_nul_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(s.as_bytes());
    out.push(0);
}

/// Cursor over a message body.
struct Parser<'a> {
    data: &'a [u8],
    msg: &'static str,
}

impl<'a> Parser<'a> {
    fn new(data: &'a [u8], id: MsgId) -> Self {
        let msg = match id {
            MsgId::ListRefs => "LIST_REFS",
            MsgId::GetObject => "GET_OBJECT",
            MsgId::CheckObjects => "CHECK_OBJECTS",
            MsgId::PutObject => "PUT_OBJECT",
            MsgId::UpdateRef => "UPDATE_REF",
            MsgId::TargetRepo => "TARGET_REPO",
            MsgId::RegisterUser => "REGISTER_USER",
            MsgId::LoginUser => "LOGIN_USER",
            _ => "response",
        };
        Self { data, msg }
    }

    fn malformed(&self, reason: impl Into<String>) -> ProtocolError {
        ProtocolError::Malformed {
            msg: self.msg,
            reason: reason.into(),
        }
    }

    fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn nul_str(&mut self) -> Result<String, ProtocolError> {
        let data = self.data;
        let pos = data
            .find_byte(0)
            .ok_or_else(|| self.malformed("missing nul terminator"))?;
        let raw = &data[..pos];
        self.data = &data[pos + 1..];
        String::from_utf8(raw.to_vec())
            .map_err(|_| self.malformed(format!("non-UTF8 field {:?}", BString::from(raw))))
    }

    fn u8(&mut self) -> Result<u8, ProtocolError> {
        let b = *self
            .data
            .first()
            .ok_or_else(|| self.malformed("missing byte"))?;
        self.data = &self.data[1..];
        Ok(b)
    }

    fn u32(&mut self) -> Result<u32, ProtocolError> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        let data = self.data;
        if data.len() < n {
            return Err(self.malformed(format!("expected {n} bytes, got {}", data.len())));
        }
        let (head, tail) = data.split_at(n);
        self.data = tail;
        Ok(head)
    }

    fn oid(&mut self) -> Result<ObjectId, ProtocolError> {
        let raw = self.take(ObjectId::HEX_LEN)?;
        let hex = std::str::from_utf8(raw).map_err(|_| self.malformed("non-UTF8 object id"))?;
        Ok(ObjectId::from_hex(hex)?)
    }

    fn rest(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.data).to_vec()
    }

    fn rest_str(&mut self) -> Result<String, ProtocolError> {
        let raw = self.rest();
        String::from_utf8(raw).map_err(|_| self.malformed("non-UTF8 text"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(n: u8) -> ObjectId {
        let mut bytes = [0u8; 20];
        bytes[19] = n;
        ObjectId::from_raw(bytes)
    }

    fn roundtrip(message: Message) {
        let frame = message.encode();
        let decoded = Message::decode(&frame).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn roundtrip_every_request() {
        roundtrip(Message::RegisterUser {
            username: "jane".into(),
            password: "secret".into(),
        });
        roundtrip(Message::LoginUser {
            username: "jane".into(),
            password: "secret".into(),
        });
        roundtrip(Message::TargetRepo {
            token: "tok".into(),
            path: "projects/demo".into(),
        });
        roundtrip(Message::ListRefs { token: "tok".into() });
        roundtrip(Message::GetObject {
            token: "tok".into(),
            oid: oid(1),
        });
        roundtrip(Message::CheckObjects {
            token: "tok".into(),
            oids: vec![oid(1), oid(2), oid(3)],
        });
        roundtrip(Message::PutObject {
            token: "tok".into(),
            oid: oid(4),
            data: b"blob 2\0hi".to_vec(),
        });
        roundtrip(Message::UpdateRef {
            token: "tok".into(),
            force: false,
            name: "refs/heads/main".into(),
            new: oid(5),
            expected_old: Some(oid(6)),
        });
        roundtrip(Message::UpdateRef {
            token: "tok".into(),
            force: true,
            name: "refs/heads/main".into(),
            new: oid(5),
            expected_old: None,
        });
    }

    #[test]
    fn roundtrip_every_response() {
        roundtrip(Message::AckOk);
        roundtrip(Message::Error("boom".into()));
        roundtrip(Message::AuthRequired);
        roundtrip(Message::RefsListBegin);
        roundtrip(Message::RefsEntry {
            name: "HEAD".into(),
            value: RefValue::Symbolic("refs/heads/main".into()),
        });
        roundtrip(Message::RefsEntry {
            name: "refs/heads/main".into(),
            value: RefValue::Direct(oid(9)),
        });
        roundtrip(Message::RefsListEnd);
        roundtrip(Message::ObjectContent {
            oid: oid(1),
            data: b"commit 1\0x".to_vec(),
        });
        roundtrip(Message::ObjectNotFound(oid(2)));
        roundtrip(Message::CheckObjectsResult(vec![true, false, true]));
        roundtrip(Message::RefUpdated);
        roundtrip(Message::RefUpdateDenied("not fast-forward".into()));
        roundtrip(Message::TargetRepoAck);
        roundtrip(Message::TargetRepoError("no such repo".into()));
        roundtrip(Message::RegisterOk);
        roundtrip(Message::LoginOk("token.sig".into()));
    }

    #[test]
    fn check_objects_count_matches_wire_layout() {
        let frame = Message::CheckObjects {
            token: "t".into(),
            oids: vec![oid(1), oid(2)],
        }
        .encode();
        // token + nul, then u32 count, then 2 x 40 hex chars.
        assert_eq!(frame.body.len(), 2 + 4 + 80);
        assert_eq!(&frame.body[2..6], &2u32.to_be_bytes());
    }

    #[test]
    fn update_ref_without_expected_old_parses() {
        let frame = Message::UpdateRef {
            token: "t".into(),
            force: false,
            name: "refs/heads/x".into(),
            new: oid(7),
            expected_old: None,
        }
        .encode();
        match Message::decode(&frame).unwrap() {
            Message::UpdateRef { expected_old, .. } => assert!(expected_old.is_none()),
            other => panic!("wrong decode: {other:?}"),
        }
    }

    #[test]
    fn unknown_id_rejected() {
        let frame = RawFrame {
            id: 9999,
            body: Vec::new(),
        };
        assert!(matches!(
            Message::decode(&frame),
            Err(ProtocolError::UnknownMessageId(9999))
        ));
    }

    #[test]
    fn truncated_oid_malformed() {
        let frame = RawFrame {
            id: MsgId::GetObject as u16,
            body: b"tok\0da39a3".to_vec(),
        };
        assert!(matches!(
            Message::decode(&frame),
            Err(ProtocolError::Malformed { .. })
        ));
    }

    #[test]
    fn requires_token_covers_authenticated_range() {
        assert!(MsgId::ListRefs.requires_token());
        assert!(MsgId::TargetRepo.requires_token());
        assert!(!MsgId::LoginUser.requires_token());
        assert!(!MsgId::AckOk.requires_token());
    }
}
