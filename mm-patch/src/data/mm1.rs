//! Mega Man (DOS) patch table
//!
//! Mega Man 1 carries dead code for a never-used 16-colour Tandy video mode;
//! its function entry points provide the space the replacement routines are
//! written into (in a few cases at a small offset from the entry point, to
//! step around a segment relocation value the EXE loader would overwrite).
//!
//! The patch adds a configurable frame-delay slowdown, a revised setup menu
//! with a slowdown setting, a joystick poll/calibration rewrite that works
//! across a much wider range of machine speeds, and a fire-button filter for
//! the selection screens.

use super::{call, jmp, word, DEFAULT_SPEED};
use crate::error::Result;
use crate::patch::{PatchRecord, PatchSet};

// Replacement routine placements: segment address once loaded / file offset.
const SLOW_ADDR: u16 = 0x219A; // unused tandy video function 0 (+12)
const SLOW_FILE: u64 = 0x1A08;
const SLOW0_ADDR: u16 = 0x5390; // main loop joystick poll hook
const SLOW0_FILE: u64 = 0x4BFE;
const TABLE_ADDR: u16 = 0x21DD; // unused tandy video function 1
const TABLE_FILE: u64 = 0x1A4B;
const SETTINGS_ADDR: u16 = 0x2277; // unused tandy video function 2 (+3)
const SETTINGS_FILE: u64 = 0x1AE5;
const SETTINGS0_ADDR: u16 = 0x50AD;
const SETTINGS0_FILE: u64 = 0x491B;
const JOY_ADDR: u16 = 0x23C0; // unused tandy video function 6 (+7)
const JOY_FILE: u64 = 0x1C2E;
const JOY0_ADDR: u16 = 0x174D; // original poll routine
const JOY0_FILE: u64 = 0x0FBB;
const JOY1_ADDR: u16 = 0x17EA; // original calibrate routine
const JOY1_FILE: u64 = 0x1058;
const SELECT_ADDR: u16 = 0x24FD; // unused tandy video function 7 (+7)
const SELECT_FILE: u64 = 0x1D6B;
const SELECT0_ADDR: u16 = 0x49BE;
const SELECT0_FILE: u64 = 0x422C;
const SELECT1_ADDR: u16 = 0x4A2B;
const SELECT1_FILE: u64 = 0x4299;
const SELECT2_ADDR: u16 = 0x52CD;
const SELECT2_FILE: u64 = 0x4B3B;
const SELECT3_ADDR: u16 = 0x53F5;
const SELECT3_FILE: u64 = 0x4C63;

/// Slowdown routine: delay a configurable number of frames by waiting on the
/// CGA/EGA vertical retrace status port, then fall through to the joystick
/// flag test the hook displaced.
fn slow() -> Vec<u8> {
    [
        &[0x9C, 0x50, 0x51, 0x52][..],  // pushf; push ax; push cx; push dx
        &[0xB9, DEFAULT_SPEED, 0x00],   // mov cx, speed
        &[0xE3, 15],                    // jcxz end
        &[0xBA],
        &word(0x03DA),                  // mov dx, 03DAh
        &[0xEC, 0xA8, 0x08, 0x74, 0xFB], // wait until not in vertical retrace
        &[0xEC, 0xA8, 0x08, 0x75, 0xFB], // wait until retrace finished
        &[0xE2, 0xF4],                  // loop wait1
        &[0x5A, 0x59, 0x58, 0x9D],      // pop dx/cx/ax; popf
        &[0x2E, 0x80, 0x3E],
        &word(0x1149),
        &[0x00],                        // cmp cs:1149h, 0 ; joystick enabled
        &[0xC3],                        // retn
    ]
    .concat()
}

/// Hook just before the main loop's joystick poll, replacing the displaced
/// `cmp cs:1149h, 0` with a call into [`slow`].
fn slow_hook() -> Vec<u8> {
    [&call(SLOW0_ADDR, SLOW_ADDR)[..], &[0x90, 0x90, 0x90]].concat()
}

/// Text and settings tables for the revised setup menu. Adds a tenth entry,
/// "Slowdown:", ahead of the original graphics/animation/masking/sound/
/// joystick settings.
fn table() -> Vec<u8> {
    let mut p = Vec::with_capacity(138);

    // Digit strings "0".."9" for the slowdown setting: x, y, len, text
    for i in 0..10u8 {
        p.extend_from_slice(&[0x28 + 2 * i, 0x09, 1, b'0' + i]);
    }
    p.extend_from_slice(&[0x18, 0x09, 9]);
    p.extend_from_slice(b"Slowdown:");

    // Slowdown entry: current value, maximum, label, option string pointers
    p.extend_from_slice(&[DEFAULT_SPEED, 9]);
    p.extend_from_slice(&word(TABLE_ADDR + 4 * 10));
    for i in 0..10 {
        p.extend_from_slice(&word(TABLE_ADDR + 4 * i));
    }

    // Original entries, pointing at the game's existing strings
    p.extend_from_slice(&[2, 3]); // graphics: default VGA, maximum TANDY
    p.extend_from_slice(&word(0x107C)); // Graphics Card:
    p.extend_from_slice(&word(0x108D)); // CGA
    p.extend_from_slice(&word(0x1093)); // EGA
    p.extend_from_slice(&word(0x1099)); // VGA
    p.extend_from_slice(&word(0x109F)); // TANDY
    p.extend_from_slice(&[0, 1]); // animation
    p.extend_from_slice(&word(0x10A7)); // Animation:
    p.extend_from_slice(&word(0x10B4)); // ON
    p.extend_from_slice(&word(0x10B9)); // OFF
    p.extend_from_slice(&[0, 1]); // masking
    p.extend_from_slice(&word(0x10BF)); // Masking:
    p.extend_from_slice(&word(0x10CA)); // ON
    p.extend_from_slice(&word(0x10CF)); // OFF
    p.extend_from_slice(&[0, 1]); // sound
    p.extend_from_slice(&word(0x10D5)); // Sound:
    p.extend_from_slice(&word(0x10DE)); // ON
    p.extend_from_slice(&word(0x10E3)); // OFF
    p.extend_from_slice(&[1, 1]); // joystick (default off)
    p.extend_from_slice(&word(0x10E9)); // Joystick:
    p.extend_from_slice(&word(0x10F5)); // ON
    p.extend_from_slice(&word(0x10FA)); // OFF
    p.extend_from_slice(&[0, 0]); // start
    p.extend_from_slice(&word(0x1100)); // Start Game

    // Settings pointer table; the "current value" byte of each entry above
    // doubles as the live option storage
    for entry in [0, 12, 12 + 6, 12 + 6 + 4, 12 + 6 + 4 + 4, 12 + 6 + 4 + 4 + 4, 12 + 6 + 4 + 4 + 4 + 4]
    {
        p.extend_from_slice(&word(TABLE_ADDR + 52 + 2 * entry));
    }

    p
}

/// Settings copy-back routine: after the setup menu runs against the new
/// table, mirror the six original settings back into the game's own table
/// and store the slowdown choice into the delay routine's immediate.
fn settings() -> Vec<u8> {
    [
        &[0x9C, 0x50, 0x53, 0x51, 0x1E][..], // pushf; push ax/bx/cx/ds
        &[0x8C, 0xC8, 0x8E, 0xD8],           // mov ax, cs / mov ds, ax
        &[0xB9, 0x06, 0x00],                 // mov cx, 6
        // repeat: count down cx from 6 to 1
        &[0x89, 0xCB, 0xD1, 0xE3],           // mov bx, cx / shl bx, 1
        &[0x8B, 0x9F],
        &word(TABLE_ADDR + 52 + 72),         // mov bx, [bx+new_settings_table]
        &[0x8A, 0x07],                       // mov al, [bx]
        &[0x89, 0xCB, 0xD1, 0xE3],           // mov bx, cx / shl bx, 1
        &[0x8B, 0x9F],
        &word(0x113D - 2),                   // mov bx, [bx+old_settings_table-2]
        &[0x88, 0x07],                       // mov [bx], al
        &[0xE2, 0xEA],                       // loop repeat
        &[0x8B, 0x1E],
        &word(TABLE_ADDR + 52 + 72),         // extra entry (0) is slowdown
        &[0x8A, 0x07],                       // mov al, [bx]
        &[0xA2],
        &word(SLOW_ADDR + 5),                // mov speed_constant, al
        &[0x1F, 0x59, 0x5B, 0x58, 0x9D],     // pop ds/cx/bx/ax; popf
        &[0x2E, 0x80, 0x3E],
        &word(0x114C),
        &[0x01],                             // cmp cs:114Ch, 1 ; sound_enabled
        &[0xC3],                             // retn
    ]
    .concat()
}

fn settings_hook() -> Vec<u8> {
    [&call(SETTINGS0_ADDR, SETTINGS_ADDR)[..], &[0x90, 0x90, 0x90]].concat()
}

/// Joystick replacement: averaged polling plus a calibrate routine that sets
/// low/high thresholds at 25% around centre, mostly lifted from Mega Man 3.
/// Layout inside the payload: +0 variable storage, +12 poll, +82 calibrate,
/// +151 replacement for the fragment of the original poll routine.
fn joy() -> Vec<u8> {
    [
        // Variable storage: accum / low / high for each axis
        &word(0)[..],
        &word(10),
        &word(30),
        &word(0),
        &word(10),
        &word(30),
        // Poll (+12); assumes ds = cs and dx = 0201h (joystick port)
        &[0xC7, 0x06],
        &word(JOY_ADDR),
        &word(0), // mov joy_x_accum, 0
        &[0xC7, 0x06],
        &word(JOY_ADDR + 6),
        &word(0), // mov joy_y_accum, 0
        &[0xB9, 0x04, 0x00], // mov cx, 4
        // average:
        &[0x51],             // push cx
        &[0x33, 0xC9, 0x33, 0xFF, 0x33, 0xF6, 0x32, 0xC0], // zero cx/di/si/al
        &[0xFA, 0xEE],       // cli / out dx, al
        // read_loop:
        &[0xEC],             // in al, dx
        &[0xA8, 0x01, 0x74, 0x01, 0x47], // test al, 1 / jz +1 / inc di
        &[0xA8, 0x02, 0x74, 0x01, 0x46], // test al, 2 / jz +1 / inc si
        &[0xA8, 0x03, 0xE0, 0xF1],       // test al, 3 / loopne read_loop
        &[0xFB],             // sti
        &[0x01, 0x3E],
        &word(JOY_ADDR),     // add joy_x_accum, di
        &[0x01, 0x36],
        &word(JOY_ADDR + 6), // add joy_y_accum, si
        &[0x59, 0xE2, 0xDA], // pop cx / loop average
        &[0x8B, 0x3E],
        &word(JOY_ADDR),     // mov di, joy_x_accum
        &[0x8B, 0x36],
        &word(JOY_ADDR + 6), // mov si, joy_y_accum
        &[0xD1, 0xEF, 0xD1, 0xEF, 0xD1, 0xEE, 0xD1, 0xEE], // average of 4
        &[0xC3],             // retn
        // Calibrate (+82): thresholds at 25% +/- around the polled centre
        &[0x9C, 0x1E, 0x57, 0x56, 0x50, 0x51, 0x52], // pushf; push ds/di/si/ax/cx/dx
        &[0x8C, 0xC8, 0x8E, 0xD8], // mov ax, cs / mov ds, ax
        &call(JOY_ADDR + 93, JOY_ADDR + 12), // call poll
        &[0x89, 0x3E],
        &word(JOY_ADDR + 2), // mov joy_x low, di
        &[0x89, 0x3E],
        &word(JOY_ADDR + 4), // mov joy_x high, di
        &[0xD1, 0xEF, 0xD1, 0xEF], // shr di, 2
        &[0x29, 0x3E],
        &word(JOY_ADDR + 2), // sub joy_x low, di
        &[0x01, 0x3E],
        &word(JOY_ADDR + 4), // add joy_x high, di
        &[0x89, 0x36],
        &word(JOY_ADDR + 8), // mov joy_y low, si
        &[0x89, 0x36],
        &word(JOY_ADDR + 10), // mov joy_y high, si
        &[0xD1, 0xEE, 0xD1, 0xEE], // shr si, 2
        &[0x29, 0x36],
        &word(JOY_ADDR + 8), // sub joy_y low, si
        &[0x01, 0x36],
        &word(JOY_ADDR + 10), // add joy_y high, si
        &[0x5A, 0x59, 0x58, 0x5E, 0x5F, 0x1F, 0x9D], // pop dx/cx/ax/si/di/ds; popf
        &[0xBB],
        &word(0x4040),       // mov bx, 4040h ; fake calibration centre
        &[0x88, 0x1E],
        &word(0x114A),       // mov joy_centre_x, bl ; replaces patched line
        &[0xC3],             // retn
        // Original poll fragment replacement (+151): jmp from 174Dh, return
        // to 175Eh with the original fragment's post-conditions faked
        &[0x9C, 0x1E, 0x57, 0x52], // pushf; push ds/di/dx
        &[0x8C, 0xC8, 0x8E, 0xD8], // mov ax, cs / mov ds, ax
        &call(JOY_ADDR + 159, JOY_ADDR + 12), // call poll
        &[0xBB],
        &word(0x4040),       // mov bx, 4040h ; fake centre
        &[0x3B, 0x3E],
        &word(JOY_ADDR + 2), // cmp di, joy_x low
        &[0x77, 0x02, 0xB3, 0x00], // ja +2 / mov bl, 0 ; fake left
        &[0x3B, 0x3E],
        &word(JOY_ADDR + 4), // cmp di, joy_x high
        &[0x72, 0x02, 0xB3, 0x80], // jb +2 / mov bl, 80h ; fake right
        &[0x3B, 0x36],
        &word(JOY_ADDR + 8), // cmp di, joy_y low
        &[0x77, 0x02, 0xB7, 0x00], // ja +2 / mov bh, 0 ; fake up
        &[0x3B, 0x36],
        &word(JOY_ADDR + 10), // cmp di, joy_y high
        &[0x72, 0x02, 0xB7, 0x80], // jb +2 / mov bh, 80h ; fake down
        &[0x31, 0xC0, 0x33, 0xC9, 0x33, 0xF6], // ax/cx/si = 0, as the skipped fragment left them
        &[0x5A, 0x5F, 0x1F, 0x9D], // pop dx/di/ds; popf
        &jmp(JOY_ADDR + 207, JOY0_ADDR + 0x11), // jmp 175Eh
    ]
    .concat()
}

fn joy_poll_hook() -> Vec<u8> {
    [&jmp(JOY0_ADDR, JOY_ADDR + 151)[..], &[0x90]].concat()
}

fn joy_calibrate_hook() -> Vec<u8> {
    [&call(JOY1_ADDR, JOY_ADDR + 82)[..], &[0x90]].concat()
}

/// Fire-button filter for the selection screens: wraps the joystick poll and
/// masks the fire bit so a held button does not repeat.
fn select() -> Vec<u8> {
    [
        &[0x00][..],            // filter variable storage
        &call(SELECT_ADDR + 1, 0x173C), // call joystick poll (+1)
        &[0x9C, 0x50, 0x1E],    // pushf; push ax; push ds
        &[0x8C, 0xC8, 0x8E, 0xD8], // mov ax, cs / mov ds, ax
        &[0xA0],
        &word(0x1204),          // mov al, input_bitfield
        &[0x8A, 0xE0],          // mov ah, al
        &[0x22, 0x06],
        &word(SELECT_ADDR),     // and al, filter
        &[0xA2],
        &word(0x1204),          // mov input_bitfield, al
        &[0x80, 0xE4, 0x80],    // and ah, 80h ; filter fire
        &[0xF6, 0xD4],          // not ah
        &[0x88, 0x26],
        &word(SELECT_ADDR),     // mov filter, ah
        &[0x1F, 0x58, 0x9D],    // pop ds; pop ax; popf
        &[0xC3],                // retn
    ]
    .concat()
}

/// The full Mega Man 1 patch set.
pub fn patch_set() -> Result<PatchSet> {
    let six = vec![6u8];
    PatchSet::new(vec![
        // slowdown
        PatchRecord::new(SLOW_FILE, slow()),
        PatchRecord::new(SLOW0_FILE, slow_hook()),
        // settings table
        PatchRecord::new(TABLE_FILE, table()),
        // increasing index of last table entry 5 -> 6
        PatchRecord::new(0x4820, six.clone()),
        PatchRecord::new(0x487D, six.clone()),
        PatchRecord::new(0x490D, six),
        // references to the original text table (110Dh) and settings
        // pointer table (113Dh), redirected to the new table
        PatchRecord::new(0x47DB, word(TABLE_ADDR + 52).to_vec()),
        PatchRecord::new(0x489C, word(TABLE_ADDR + 52 + 72).to_vec()),
        PatchRecord::new(0x48BB, word(TABLE_ADDR + 52 + 72).to_vec()),
        // settings finalization
        PatchRecord::new(SETTINGS_FILE, settings()),
        PatchRecord::new(SETTINGS0_FILE, settings_hook()),
        // joystick routine replacement
        PatchRecord::new(JOY_FILE, joy()),
        PatchRecord::new(JOY0_FILE, joy_poll_hook()),
        PatchRecord::new(JOY1_FILE, joy_calibrate_hook()),
        // selection screen joystick input filter
        PatchRecord::new(SELECT_FILE, select()),
        PatchRecord::new(SELECT0_FILE, call(SELECT0_ADDR, SELECT_ADDR + 1).to_vec()),
        PatchRecord::new(SELECT1_FILE, call(SELECT1_ADDR, SELECT_ADDR + 1).to_vec()),
        PatchRecord::new(SELECT2_FILE, call(SELECT2_ADDR, SELECT_ADDR + 1).to_vec()),
        PatchRecord::new(SELECT3_FILE, call(SELECT3_ADDR, SELECT_ADDR + 1).to_vec()),
    ])
}
