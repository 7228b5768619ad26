//! Hot-reload wire protocol
//!
//! Fixed-layout, little-endian framing for pushing a recompiled shader to a
//! running engine process. The magic number and packet-type identifiers are
//! CRC-32 (ISO-HDLC) checksums of fixed ASCII strings; they identify the
//! protocol, not the content, and must stay in sync with the engine's
//! packet definitions.

use crc::{Crc, CRC_32_ISO_HDLC};
use thiserror::Error;

const PROTOCOL_CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// crc32("FORGE_PACKET")
pub const PACKET_MAGIC: u32 = 0x2fb2_966b;

/// Protocol version carried in every packet header
pub const PACKET_VERSION: u32 = 0;

/// crc32("I_AM_GAME")
const PACKET_TYPE_REGISTER_GAME: u32 = 0xc73d_7cd9;

/// crc32("HOT_RELOAD_SHADER_REQUEST")
const PACKET_TYPE_HOT_RELOAD_SHADER: u32 = 0x1ee5_5a28;

/// Fixed header: magic, version, type, total length (u32 each), name and
/// payload offsets (u64 each), name and payload lengths (u32 each).
pub const HEADER_SIZE: usize = 40;

/// Packet-type registry shared with the engine's asset server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    Unknown,
    /// A game process announcing itself to the asset server
    RegisterGame,
    /// A freshly compiled shader pushed into a running process
    HotReloadShader,
}

impl PacketType {
    pub fn id(self) -> u32 {
        match self {
            Self::Unknown => 0,
            Self::RegisterGame => PACKET_TYPE_REGISTER_GAME,
            Self::HotReloadShader => PACKET_TYPE_HOT_RELOAD_SHADER,
        }
    }

    pub fn from_id(id: u32) -> Self {
        match id {
            PACKET_TYPE_REGISTER_GAME => Self::RegisterGame,
            PACKET_TYPE_HOT_RELOAD_SHADER => Self::HotReloadShader,
            _ => Self::Unknown,
        }
    }
}

/// Errors from decoding a received frame
#[derive(Debug, Error)]
pub enum PacketDecodeError {
    #[error("frame too short: {0} bytes")]
    Truncated(usize),

    #[error("bad magic number {0:#010x}")]
    BadMagic(u32),

    #[error("unsupported protocol version {0}")]
    BadVersion(u32),

    #[error("unexpected packet type {0:#010x}")]
    BadType(u32),

    #[error("entry-point name is not valid UTF-8")]
    BadName,
}

/// One hot-reload request: an entry-point name plus its raw compiled
/// bytecode. Built, transmitted, and dropped; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotReloadPacket {
    pub entry_point: String,
    pub bytecode: Vec<u8>,
}

impl HotReloadPacket {
    pub fn new(entry_point: impl Into<String>, bytecode: Vec<u8>) -> Self {
        Self {
            entry_point: entry_point.into(),
            bytecode,
        }
    }

    /// Length of the name field: UTF-8 bytes plus the NUL terminator
    pub fn name_len(&self) -> u32 {
        self.entry_point.len() as u32 + 1
    }

    /// Total frame size: header + name + payload
    pub fn total_len(&self) -> u32 {
        HEADER_SIZE as u32 + self.name_len() + self.bytecode.len() as u32
    }

    /// Encode the whole frame, ready for a single write.
    pub fn encode(&self) -> Vec<u8> {
        let name_len = self.name_len();
        let payload_len = self.bytecode.len() as u32;
        let name_offset = HEADER_SIZE as u64;
        let payload_offset = name_offset + name_len as u64;

        let mut frame = Vec::with_capacity(self.total_len() as usize);
        frame.extend_from_slice(&PACKET_MAGIC.to_le_bytes());
        frame.extend_from_slice(&PACKET_VERSION.to_le_bytes());
        frame.extend_from_slice(&PacketType::HotReloadShader.id().to_le_bytes());
        frame.extend_from_slice(&self.total_len().to_le_bytes());
        frame.extend_from_slice(&name_offset.to_le_bytes());
        frame.extend_from_slice(&payload_offset.to_le_bytes());
        frame.extend_from_slice(&name_len.to_le_bytes());
        frame.extend_from_slice(&payload_len.to_le_bytes());
        frame.extend_from_slice(self.entry_point.as_bytes());
        frame.push(0);
        frame.extend_from_slice(&self.bytecode);
        frame
    }

    /// Decode a received frame. The receiving side of the protocol; also
    /// pins the encoder in tests.
    pub fn decode(frame: &[u8]) -> Result<Self, PacketDecodeError> {
        if frame.len() < HEADER_SIZE {
            return Err(PacketDecodeError::Truncated(frame.len()));
        }

        let magic = read_u32(frame, 0);
        if magic != PACKET_MAGIC {
            return Err(PacketDecodeError::BadMagic(magic));
        }
        let version = read_u32(frame, 4);
        if version != PACKET_VERSION {
            return Err(PacketDecodeError::BadVersion(version));
        }
        let type_id = read_u32(frame, 8);
        if PacketType::from_id(type_id) != PacketType::HotReloadShader {
            return Err(PacketDecodeError::BadType(type_id));
        }

        let total_len = read_u32(frame, 12) as usize;
        let name_offset = read_u64(frame, 16) as usize;
        let payload_offset = read_u64(frame, 24) as usize;
        let name_len = read_u32(frame, 32) as usize;
        let payload_len = read_u32(frame, 36) as usize;

        if frame.len() < total_len
            || name_offset + name_len > total_len
            || payload_offset + payload_len > total_len
            || name_len == 0
        {
            return Err(PacketDecodeError::Truncated(frame.len()));
        }

        // Name is NUL-terminated; the terminator is part of name_len.
        let name_bytes = &frame[name_offset..name_offset + name_len - 1];
        let entry_point = std::str::from_utf8(name_bytes)
            .map_err(|_| PacketDecodeError::BadName)?
            .to_string();
        let bytecode = frame[payload_offset..payload_offset + payload_len].to_vec();

        Ok(Self {
            entry_point,
            bytecode,
        })
    }
}

/// CRC-32 of a protocol identifier string, as the engine computes it
pub fn identifier_checksum(identifier: &str) -> u32 {
    PROTOCOL_CRC.checksum(identifier.as_bytes())
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap())
}

fn read_u64(buf: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(buf[offset..offset + 8].try_into().unwrap())
}
