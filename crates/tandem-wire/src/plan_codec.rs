//! Binary encode/decode for resend plans.
//!
//! All integers are little-endian. Payloads and dedupe keys are
//! length-prefixed with a `u32`. The encoded plan is usually larger than
//! one packet, so it is sent through [`split_into_chunks`](crate::split_into_chunks).
//!
//! ```text
//! [VERSION u8] [requesting u32] [start u32] [end u32]
//! [info_count u32] { [sender u32] [frame u32] [count u32] }*
//! [command_count u32] { [sender u32] [frame u32] [type u32] [player u32]
//!                       [sort u32] [payload len+bytes] [has_key u8] [key len+bytes]? }*
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tandem_core::DeterministicCommand;
use tandem_resend::{FrameInfo, ResendCommand, ResendPlan};

use crate::error::PlanCodecError;

/// Current plan encoding version.
pub const PLAN_FORMAT_VERSION: u8 = 1;

// ── Primitive helpers ───────────────────────────────────────────

fn put_len(buf: &mut BytesMut, field: &'static str, len: usize) -> Result<(), PlanCodecError> {
    let len = u32::try_from(len).map_err(|_| PlanCodecError::TooLarge { field, length: len })?;
    buf.put_u32_le(len);
    Ok(())
}

fn put_length_prefixed(
    buf: &mut BytesMut,
    field: &'static str,
    bytes: &[u8],
) -> Result<(), PlanCodecError> {
    put_len(buf, field, bytes.len())?;
    buf.put_slice(bytes);
    Ok(())
}

fn get_u8(buf: &mut &[u8], field: &'static str) -> Result<u8, PlanCodecError> {
    if buf.remaining() < 1 {
        return Err(PlanCodecError::Truncated { field });
    }
    Ok(buf.get_u8())
}

fn get_u32(buf: &mut &[u8], field: &'static str) -> Result<u32, PlanCodecError> {
    if buf.remaining() < 4 {
        return Err(PlanCodecError::Truncated { field });
    }
    Ok(buf.get_u32_le())
}

fn get_length_prefixed(buf: &mut &[u8], field: &'static str) -> Result<Bytes, PlanCodecError> {
    let len = get_u32(buf, field)? as usize;
    if buf.remaining() < len {
        return Err(PlanCodecError::Truncated { field });
    }
    Ok(buf.copy_to_bytes(len))
}

// ── Plan encode/decode ──────────────────────────────────────────

/// Encode a resend plan.
///
/// # Errors
///
/// [`PlanCodecError::TooLarge`] if a list, payload, or dedupe key does not
/// fit its `u32` length prefix.
pub fn encode_resend_plan(plan: &ResendPlan<DeterministicCommand>) -> Result<Bytes, PlanCodecError> {
    let mut buf = BytesMut::with_capacity(17 + plan.frame_info.len() * 12 + plan.commands.len() * 32);
    buf.put_u8(PLAN_FORMAT_VERSION);
    buf.put_u32_le(plan.requesting_player_id);
    buf.put_u32_le(plan.resend_start_frame);
    buf.put_u32_le(plan.end_frame_exclusive);

    put_len(&mut buf, "frame_info", plan.frame_info.len())?;
    for info in &plan.frame_info {
        buf.put_u32_le(info.sender_player_id);
        buf.put_u32_le(info.frame);
        buf.put_u32_le(info.command_count);
    }

    put_len(&mut buf, "commands", plan.commands.len())?;
    for entry in &plan.commands {
        let cmd = &entry.command;
        buf.put_u32_le(entry.sender_player_id);
        buf.put_u32_le(entry.frame);
        buf.put_u32_le(cmd.command_type);
        buf.put_u32_le(cmd.player_id);
        buf.put_u32_le(cmd.sort_number);
        put_length_prefixed(&mut buf, "payload", &cmd.payload)?;
        match &cmd.dedupe_key {
            Some(key) => {
                buf.put_u8(1);
                put_length_prefixed(&mut buf, "dedupe_key", key.as_bytes())?;
            }
            None => buf.put_u8(0),
        }
    }

    Ok(buf.freeze())
}

/// Decode a plan produced by [`encode_resend_plan`].
///
/// The whole buffer must be consumed; trailing bytes are an error.
pub fn decode_resend_plan(data: &[u8]) -> Result<ResendPlan<DeterministicCommand>, PlanCodecError> {
    let mut buf = data;

    let version = get_u8(&mut buf, "version")?;
    if version != PLAN_FORMAT_VERSION {
        return Err(PlanCodecError::UnsupportedVersion { found: version });
    }

    let requesting_player_id = get_u32(&mut buf, "requesting_player_id")?;
    let resend_start_frame = get_u32(&mut buf, "resend_start_frame")?;
    let end_frame_exclusive = get_u32(&mut buf, "end_frame_exclusive")?;

    // Counts are untrusted; grow as entries are actually read.
    let info_count = get_u32(&mut buf, "frame_info count")?;
    let mut frame_info = Vec::new();
    for _ in 0..info_count {
        frame_info.push(FrameInfo {
            sender_player_id: get_u32(&mut buf, "frame_info sender")?,
            frame: get_u32(&mut buf, "frame_info frame")?,
            command_count: get_u32(&mut buf, "frame_info count")?,
        });
    }

    let command_count = get_u32(&mut buf, "command count")?;
    let mut commands = Vec::new();
    for _ in 0..command_count {
        let sender_player_id = get_u32(&mut buf, "command sender")?;
        let frame = get_u32(&mut buf, "command frame")?;
        let command_type = get_u32(&mut buf, "command_type")?;
        let player_id = get_u32(&mut buf, "player_id")?;
        let sort_number = get_u32(&mut buf, "sort_number")?;
        let payload = get_length_prefixed(&mut buf, "payload")?;
        let dedupe_key = match get_u8(&mut buf, "dedupe_key flag")? {
            0 => None,
            1 => {
                let raw = get_length_prefixed(&mut buf, "dedupe_key")?;
                Some(
                    String::from_utf8(raw.to_vec())
                        .map_err(|_| PlanCodecError::InvalidDedupeKey)?,
                )
            }
            flag => return Err(PlanCodecError::InvalidFlag { flag }),
        };

        commands.push(ResendCommand {
            sender_player_id,
            frame,
            command: DeterministicCommand {
                command_type,
                player_id,
                sort_number,
                payload,
                dedupe_key,
            },
        });
    }

    if buf.has_remaining() {
        return Err(PlanCodecError::TrailingBytes {
            count: buf.remaining(),
        });
    }

    Ok(ResendPlan {
        requesting_player_id,
        resend_start_frame,
        end_frame_exclusive,
        frame_info,
        commands,
    })
}
