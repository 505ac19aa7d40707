//! Top-level `Stack`: owns the OSAL, the port (transport) arena, and the
//! server/client channel arenas, keyed by stable-index handles.
//!
//! Generalized from the teacher's `Scheduler`'s `[Option<ScheduleEntry>; N]`
//! fixed-slot array — applied once per arena kind here instead of a single
//! tagged union, so each handle type stays distinct at the type level
//! without needing `dyn` dispatch (REDESIGN FLAG 1: this replaces what the
//! distilled spec describes as a process-wide global registry).

use crate::bytepipe::BytePipe;
use crate::client::ClientChannel;
use crate::config::{OsalConfig, PortConfig};
use crate::error::{Error, ProgrammerError, Result};
use crate::osal::{ContextId, Osal};
use crate::rtu::TransportContext;
use crate::server::{ServerChannel, ServerDataPorts};

/// Compile-time cap on the number of UART ports a `Stack` can host.
pub const MAX_PORTS: usize = 8;
/// Compile-time cap on the number of server or client channels a `Stack`
/// can host (each counted separately).
pub const MAX_CHANNELS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortHandle(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerHandle(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientHandle(pub(crate) usize);

/// A channel cross-linked to a transport is one of these two kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelHandle {
    Server(ServerHandle),
    Client(ClientHandle),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ContextKind {
    Port = 0,
    Server = 1,
    Client = 2,
}

const KIND_SHIFT: u16 = 14;
const INDEX_MASK: u16 = 0x3FFF;

fn make_context_id(kind: ContextKind, index: usize) -> ContextId {
    debug_assert!(index <= INDEX_MASK as usize);
    ContextId(((kind as u16) << KIND_SHIFT) | (index as u16 & INDEX_MASK))
}

fn decode_context_id(id: ContextId) -> (u8, usize) {
    ((id.0 >> KIND_SHIFT) as u8, (id.0 & INDEX_MASK) as usize)
}

/// Owns every transport and channel in the system. One `Osal` instance is
/// shared by all of them (§4.1: "a single OSAL instance is initialized
/// exactly once").
pub struct Stack<P: BytePipe, D: ServerDataPorts> {
    osal: Osal,
    osal_config: OsalConfig,
    ports: [Option<TransportContext<P>>; MAX_PORTS],
    servers: [Option<ServerChannel<D>>; MAX_CHANNELS],
    clients: [Option<ClientChannel>; MAX_CHANNELS],
}

impl<P: BytePipe, D: ServerDataPorts> Stack<P, D> {
    pub fn new(osal_config: OsalConfig) -> Result<Self> {
        osal_config.validate()?;
        Ok(Self {
            osal: Osal::new(osal_config.backend, osal_config.event_queue_size),
            osal_config,
            ports: core::array::from_fn(|_| None),
            servers: core::array::from_fn(|_| None),
            clients: core::array::from_fn(|_| None),
        })
    }

    pub fn osal(&self) -> &Osal {
        &self.osal
    }

    /// Create a UART transport in the first free slot.
    pub fn create_transport(&mut self, pipe: P, port_cfg: &PortConfig) -> Result<PortHandle> {
        port_cfg.validate()?;
        let idx = self
            .ports
            .iter()
            .position(Option::is_none)
            .ok_or(Error::Programmer(ProgrammerError::ArenaExhausted))?;
        let ctx_id = make_context_id(ContextKind::Port, idx);
        let transport = TransportContext::new(ctx_id, pipe, port_cfg.baud, port_cfg.parity)?;
        self.ports[idx] = Some(transport);
        Ok(PortHandle(idx))
    }

    pub fn release_transport(&mut self, handle: PortHandle) -> Result<()> {
        let slot = self
            .ports
            .get_mut(handle.0)
            .ok_or(Error::Programmer(ProgrammerError::UseAfterFree))?;
        if let Some(t) = slot {
            if t.linked_channel.is_some() {
                return Err(Error::Programmer(ProgrammerError::AlreadyLinked));
            }
        }
        *slot = None;
        Ok(())
    }

    pub fn port_mut(&mut self, handle: PortHandle) -> Result<&mut TransportContext<P>> {
        self.ports
            .get_mut(handle.0)
            .and_then(Option::as_mut)
            .ok_or(Error::Programmer(ProgrammerError::UseAfterFree))
    }

    /// Create a server channel and cross-link it to `port`.
    pub fn create_server_channel(&mut self, port: PortHandle, node: u8, ports: D) -> Result<ServerHandle> {
        let transport = self.port_mut(port)?;
        if transport.linked_channel.is_some() {
            return Err(Error::Programmer(ProgrammerError::AlreadyLinked));
        }
        let idx = self
            .servers
            .iter()
            .position(Option::is_none)
            .ok_or(Error::Programmer(ProgrammerError::ArenaExhausted))?;
        let ctx_id = make_context_id(ContextKind::Server, idx);
        self.servers[idx] = Some(ServerChannel::new(ctx_id, port, node, ports));
        self.port_mut(port)?.linked_channel = Some(ChannelHandle::Server(ServerHandle(idx)));
        Ok(ServerHandle(idx))
    }

    /// Create a client channel and cross-link it to `port`. Fails fast
    /// (REDESIGN FLAG 2) under the cooperative backend, since client API
    /// calls cannot block there and would otherwise hang silently.
    pub fn create_client_channel(
        &mut self,
        port: PortHandle,
        response_timeout_ms: u32,
        turnaround_delay_ms: u32,
    ) -> Result<ClientHandle> {
        if self.osal.is_cooperative() {
            return Err(Error::Config(
                "client channels are not supported under the cooperative OSAL backend",
            ));
        }
        let transport = self.port_mut(port)?;
        if transport.linked_channel.is_some() {
            return Err(Error::Programmer(ProgrammerError::AlreadyLinked));
        }
        let idx = self
            .clients
            .iter()
            .position(Option::is_none)
            .ok_or(Error::Programmer(ProgrammerError::ArenaExhausted))?;
        let ctx_id = make_context_id(ContextKind::Client, idx);
        self.clients[idx] = Some(ClientChannel::new(ctx_id, port, response_timeout_ms, turnaround_delay_ms));
        self.port_mut(port)?.linked_channel = Some(ChannelHandle::Client(ClientHandle(idx)));
        Ok(ClientHandle(idx))
    }

    pub fn release_server_channel(&mut self, handle: ServerHandle) -> Result<()> {
        self.unlink_channel(ChannelHandle::Server(handle))?;
        self.servers[handle.0] = None;
        Ok(())
    }

    pub fn release_client_channel(&mut self, handle: ClientHandle) -> Result<()> {
        self.unlink_channel(ChannelHandle::Client(handle))?;
        self.clients[handle.0] = None;
        Ok(())
    }

    fn unlink_channel(&mut self, handle: ChannelHandle) -> Result<()> {
        for port in self.ports.iter_mut().flatten() {
            if port.linked_channel == Some(handle) {
                port.linked_channel = None;
            }
        }
        Ok(())
    }

    pub fn server_mut(&mut self, handle: ServerHandle) -> Result<&mut ServerChannel<D>> {
        self.servers
            .get_mut(handle.0)
            .and_then(Option::as_mut)
            .ok_or(Error::Programmer(ProgrammerError::UseAfterFree))
    }

    pub fn client_mut(&mut self, handle: ClientHandle) -> Result<&mut ClientChannel> {
        self.clients
            .get_mut(handle.0)
            .and_then(Option::as_mut)
            .ok_or(Error::Programmer(ProgrammerError::UseAfterFree))
    }

    /// Both the server and its linked transport, mutably, in one borrow —
    /// needed because `ServerChannel::process` takes `&mut TransportContext`
    /// while mutating its own state. Safe because `servers` and `ports` are
    /// disjoint fields of `Self`.
    pub fn server_and_port_mut(
        &mut self,
        handle: ServerHandle,
    ) -> Result<(&mut ServerChannel<D>, &mut TransportContext<P>)> {
        let server = self
            .servers
            .get_mut(handle.0)
            .and_then(Option::as_mut)
            .ok_or(Error::Programmer(ProgrammerError::UseAfterFree))?;
        let port = server.port();
        let transport = self
            .ports
            .get_mut(port.0)
            .and_then(Option::as_mut)
            .ok_or(Error::Programmer(ProgrammerError::UseAfterFree))?;
        Ok((server, transport))
    }

    /// Both the client and its linked transport, mutably, in one borrow — see
    /// `server_and_port_mut`.
    pub fn client_and_port_mut(
        &mut self,
        handle: ClientHandle,
    ) -> Result<(&mut ClientChannel, &mut TransportContext<P>)> {
        let client = self
            .clients
            .get_mut(handle.0)
            .and_then(Option::as_mut)
            .ok_or(Error::Programmer(ProgrammerError::UseAfterFree))?;
        let port = client.port();
        let transport = self
            .ports
            .get_mut(port.0)
            .and_then(Option::as_mut)
            .ok_or(Error::Programmer(ProgrammerError::UseAfterFree))?;
        Ok((client, transport))
    }

    /// Route an event posted against an opaque `ContextId` to the arena it
    /// names. The dispatcher calls this without needing to know whether the
    /// id names a transport, server, or client.
    pub(crate) fn resolve(&self, ctx: ContextId) -> Option<ResolvedContext> {
        let (kind, idx) = decode_context_id(ctx);
        match kind {
            0 if self.ports[idx].is_some() => Some(ResolvedContext::Port(PortHandle(idx))),
            1 if self.servers[idx].is_some() => Some(ResolvedContext::Server(ServerHandle(idx))),
            2 if self.clients[idx].is_some() => Some(ResolvedContext::Client(ClientHandle(idx))),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResolvedContext {
    Port(PortHandle),
    Server(ServerHandle),
    Client(ClientHandle),
}

/// Recompute the `ContextId` a channel handle was assigned at creation, so
/// the dispatcher can post an event addressed to it without the channel
/// itself needing to expose its id.
pub(crate) fn channel_context_id(handle: ChannelHandle) -> ContextId {
    match handle {
        ChannelHandle::Server(ServerHandle(idx)) => make_context_id(ContextKind::Server, idx),
        ChannelHandle::Client(ClientHandle(idx)) => make_context_id(ContextKind::Client, idx),
    }
}
