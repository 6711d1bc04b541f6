//! TCP connection and request/response plumbing.

use std::net::TcpStream;

use biogit_protocol::{FrameReader, FrameWriter, Message, RefValue};

use crate::ClientError;

/// A parsed remote URL of the form `host:port/repo/path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUrl {
    pub host: String,
    pub port: u16,
    pub repo_path: String,
}

impl RemoteUrl {
    /// Parse `host:port/path`. The path part may contain further slashes.
    pub fn parse(url: &str) -> Result<Self, ClientError> {
        let bad = || ClientError::InvalidUrl(url.to_string());

        let (addr, repo_path) = url.split_once('/').ok_or_else(bad)?;
        let (host, port) = addr.rsplit_once(':').ok_or_else(bad)?;
        let port: u16 = port.parse().map_err(|_| bad())?;
        if host.is_empty() || repo_path.is_empty() {
            return Err(bad());
        }

        Ok(Self {
            host: host.to_string(),
            port,
            repo_path: repo_path.to_string(),
        })
    }

    /// The socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// One blocking protocol connection.
pub struct Connection {
    reader: FrameReader<TcpStream>,
    writer: FrameWriter<TcpStream>,
}

impl Connection {
    /// Connect to a server address (`host:port`).
    pub fn connect(addr: &str) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr)?;
        let reader = FrameReader::new(stream.try_clone()?);
        let writer = FrameWriter::new(stream);
        Ok(Self { reader, writer })
    }

    /// Send one message.
    pub fn send(&mut self, message: &Message) -> Result<(), ClientError> {
        self.writer.write_frame(&message.encode())?;
        Ok(())
    }

    /// Receive one message.
    pub fn recv(&mut self) -> Result<Message, ClientError> {
        let frame = self.reader.read_frame()?;
        Ok(Message::decode(&frame)?)
    }

    /// Send one request and read its single response, translating the
    /// generic failure responses into client errors.
    pub fn request(&mut self, message: &Message) -> Result<Message, ClientError> {
        self.send(message)?;
        let response = self.recv()?;
        match response {
            Message::AuthRequired => Err(ClientError::AuthRequired),
            Message::Error(reason) => Err(ClientError::Server(reason)),
            other => Ok(other),
        }
    }

    /// Register a new account.
    pub fn register(&mut self, username: &str, password: &str) -> Result<(), ClientError> {
        let response = self.request(&Message::RegisterUser {
            username: username.to_string(),
            password: password.to_string(),
        })?;
        match response {
            Message::RegisterOk => Ok(()),
            other => Err(unexpected("REGISTER_OK", other)),
        }
    }

    /// Log in; returns the session token.
    pub fn login(&mut self, username: &str, password: &str) -> Result<String, ClientError> {
        let response = self.request(&Message::LoginUser {
            username: username.to_string(),
            password: password.to_string(),
        })?;
        match response {
            Message::LoginOk(token) => Ok(token),
            other => Err(unexpected("LOGIN_OK", other)),
        }
    }

    /// Bind this connection to a repository on the server.
    pub fn target_repo(&mut self, token: &str, repo_path: &str) -> Result<(), ClientError> {
        let response = self.request(&Message::TargetRepo {
            token: token.to_string(),
            path: repo_path.to_string(),
        })?;
        match response {
            Message::TargetRepoAck => Ok(()),
            Message::TargetRepoError(reason) => Err(ClientError::TargetRepo(reason)),
            other => Err(unexpected("TARGET_REPO_ACK", other)),
        }
    }

    /// List the remote's refs, including its symbolic `HEAD`.
    pub fn list_refs(&mut self, token: &str) -> Result<Vec<(String, RefValue)>, ClientError> {
        let response = self.request(&Message::ListRefs {
            token: token.to_string(),
        })?;
        if !matches!(response, Message::RefsListBegin) {
            return Err(unexpected("REFS_LIST_BEGIN", response));
        }

        let mut refs = Vec::new();
        loop {
            match self.recv()? {
                Message::RefsEntry { name, value } => refs.push((name, value)),
                Message::RefsListEnd => break,
                other => return Err(unexpected("REFS_ENTRY or REFS_LIST_END", other)),
            }
        }
        Ok(refs)
    }
}

pub(crate) fn unexpected(expected: &'static str, got: Message) -> ClientError {
    ClientError::Unexpected {
        expected,
        got: format!("{:?}", got.id()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_url() {
        let url = RemoteUrl::parse("localhost:9418/projects/demo").unwrap();
        assert_eq!(url.host, "localhost");
        assert_eq!(url.port, 9418);
        assert_eq!(url.repo_path, "projects/demo");
        assert_eq!(url.addr(), "localhost:9418");
    }

    #[test]
    fn parse_rejects_bad_urls() {
        for bad in ["", "nohost", "host/path", "host:notaport/path", ":9418/p", "host:1/"] {
            assert!(RemoteUrl::parse(bad).is_err(), "{bad:?} should fail");
        }
    }
}
