//! Mega Man 3 (DOS) patch tables
//!
//! Mega Man 3 has no unused video code to reclaim, so the patch comes in two
//! mutually exclusive flavours: a CGA/Tandy build that overwrites the EGA
//! video functions, and an EGA build that overwrites the CGA ones. The two
//! share almost all payload bytes; only the embedded addresses differ by the
//! distance between where the replacement routines land in each build, plus
//! the default/allowed video mode configuration bytes.
//!
//! The CGA payloads serve as the templates. The EGA payloads are derived
//! from them with [`Relocation`], shifting each marked word by the relevant
//! placement delta; the templates themselves are never modified, so the CGA
//! set keeps using them untouched.

use super::{call, word, DEFAULT_SPEED};
use crate::error::Result;
use crate::patch::{PatchRecord, PatchSet};
use crate::reloc::Relocation;

// CGA build placements: ega video functions 0, 1, 3, 4.
const CGA_SLOW_ADDR: u16 = 0x61D5;
const CGA_TABLE_ADDR: u16 = 0x6236;
const CGA_SETTINGS_ADDR: u16 = 0x6372;
const CGA_SELECT_ADDR: u16 = 0x63DE;
const CGA_SLOW_FILE: u64 = 0x1644;
const CGA_TABLE_FILE: u64 = 0x16A5;
const CGA_SETTINGS_FILE: u64 = 0x17E1;
const CGA_SELECT_FILE: u64 = 0x184D;

// EGA build placements: cga video functions 0, 1, 3, 4.
const EGA_SLOW_ADDR: u16 = 0x75C5;
const EGA_TABLE_ADDR: u16 = 0x7609;
const EGA_SETTINGS_ADDR: u16 = 0x76A4;
const EGA_SELECT_ADDR: u16 = 0x7721;
const EGA_SLOW_FILE: u64 = 0x2A34;
const EGA_TABLE_FILE: u64 = 0x2A78;
const EGA_SETTINGS_FILE: u64 = 0x2B13;
const EGA_SELECT_FILE: u64 = 0x2B90;

// Video mode configuration: the CGA build defaults to CGA and allows
// CGA/Tandy (0, 2); the EGA build pins EGA (1).
const CGA_VIDEO_DEFAULT: u8 = 0;
const CGA_VIDEO_AND: u8 = 0x02;
const CGA_VIDEO_OR: u8 = 0x00;
const EGA_VIDEO_DEFAULT: u8 = 1;
const EGA_VIDEO_AND: u8 = 0x00;
const EGA_VIDEO_OR: u8 = 0x01;

// Hook sites shared by both builds.
const SLOW0_ADDR: u16 = 0xD7FD;
const SLOW0_FILE: u64 = 0x8ADA;
const SETTINGS0_ADDR: u16 = 0xD55D;
const SETTINGS0_FILE: u64 = 0x883A;
const SELECT_HOOKS: [(u16, u64); 7] = [
    (0xCE83, 0x8160),
    (0xD262, 0x853F), // stage select; additionally filters left/right
    (0xD395, 0x8672),
    (0xD6F4, 0x89D1),
    (0xD729, 0x8A06),
    (0xD75E, 0x8A3B),
    (0xD864, 0x8B41),
];

/// Frame-delay slowdown routine; identical bytes in both builds since it
/// only references fixed game addresses.
fn slow() -> Vec<u8> {
    [
        &[0x9C, 0x50, 0x51, 0x52][..],   // pushf; push ax; push cx; push dx
        &[0xB9, DEFAULT_SPEED, 0x00],    // mov cx, speed
        &[0xE3, 15],                     // jcxz end
        &[0xBA],
        &word(0x03DA),                   // mov dx, 03DAh
        &[0xEC, 0xA8, 0x08, 0x74, 0xFB], // wait until not in vertical retrace
        &[0xEC, 0xA8, 0x08, 0x75, 0xFB], // wait until retrace finished
        &[0xE2, 0xF4],                   // loop wait1
        &[0x5A, 0x59, 0x58, 0x9D],       // pop dx/cx/ax; popf
        &[0x80, 0x3E],
        &word(0x505B),
        &[0x00],                         // cmp ds:505Bh, 0 ; joystick enabled
        &[0xC3],                         // retn
    ]
    .concat()
}

fn slow_hook(slow_addr: u16) -> Vec<u8> {
    [&call(SLOW0_ADDR, slow_addr)[..], &[0x90, 0x90]].concat()
}

/// Setup menu table, CGA-addressed template. Same shape as the Mega Man 1
/// table, against Mega Man 3's own string locations; the graphics entry has
/// one fewer option (no VGA).
fn table_template() -> Vec<u8> {
    let mut p = Vec::with_capacity(136);

    for i in 0..10u8 {
        p.extend_from_slice(&[0x28 + 2 * i, 0x09, 1, b'0' + i]);
    }
    p.extend_from_slice(&[0x18, 0x09, 9]);
    p.extend_from_slice(b"Slowdown:");

    p.extend_from_slice(&[DEFAULT_SPEED, 9]);
    p.extend_from_slice(&word(CGA_TABLE_ADDR + 4 * 10));
    for i in 0..10 {
        p.extend_from_slice(&word(CGA_TABLE_ADDR + 4 * i));
    }

    p.extend_from_slice(&[CGA_VIDEO_DEFAULT, 2]); // graphics: 0 CGA, 1 EGA, 2 TANDY
    p.extend_from_slice(&word(0x4F8C)); // Graphics Card:
    p.extend_from_slice(&word(0x4F9D)); // CGA
    p.extend_from_slice(&word(0x4FA3)); // EGA
    p.extend_from_slice(&word(0x4FA9)); // TANDY
    p.extend_from_slice(&[0, 1]); // animation
    p.extend_from_slice(&word(0x4FB1)); // Animation:
    p.extend_from_slice(&word(0x4FBE)); // ON
    p.extend_from_slice(&word(0x4FC3)); // OFF
    p.extend_from_slice(&[0, 1]); // masking
    p.extend_from_slice(&word(0x4FC9)); // Masking:
    p.extend_from_slice(&word(0x4FD4)); // ON
    p.extend_from_slice(&word(0x4FD9)); // OFF
    p.extend_from_slice(&[0, 1]); // sound
    p.extend_from_slice(&word(0x4FDF)); // Sound:
    p.extend_from_slice(&word(0x4FE8)); // ON
    p.extend_from_slice(&word(0x4FED)); // OFF
    p.extend_from_slice(&[1, 1]); // joystick (default off)
    p.extend_from_slice(&word(0x4FF3)); // Joystick:
    p.extend_from_slice(&word(0x4FFF)); // ON
    p.extend_from_slice(&word(0x5004)); // OFF
    p.extend_from_slice(&[0, 0]); // start
    p.extend_from_slice(&word(0x500A)); // Start Game

    for entry in [0, 12, 12 + 5, 12 + 5 + 4, 12 + 5 + 4 + 4, 12 + 5 + 4 + 4 + 4, 12 + 5 + 4 + 4 + 4 + 4]
    {
        p.extend_from_slice(&word(CGA_TABLE_ADDR + 52 + 2 * entry));
    }

    p
}

/// Settings copy-back routine, CGA-addressed template. Besides mirroring the
/// menu results back into the game's settings table, it masks the selected
/// graphics mode down to what the build actually supports.
fn settings_template() -> Vec<u8> {
    [
        &[0x9C, 0x50, 0x53, 0x51, 0x1E][..],  // pushf; push ax/bx/cx/ds
        &[0x8C, 0xC8, 0x8E, 0xD8],            // mov ax, cs / mov ds, ax
        &[0xB9, 0x06, 0x00],                  // mov cx, 6
        // repeat: count down cx from 6 to 1
        &[0x89, 0xCB, 0xD1, 0xE3],            // mov bx, cx / shl bx, 1
        &[0x8B, 0x9F],
        &word(CGA_TABLE_ADDR + 52 + 70),      // mov bx, [bx+new_settings_table]
        &[0x8A, 0x07],                        // mov al, [bx]
        &[0x89, 0xCB, 0xD1, 0xE3],            // mov bx, cx / shl bx, 1
        &[0x8B, 0x9F],
        &word(0x5048 - 2),                    // mov bx, [bx+old_settings_table-2]
        &[0x88, 0x07],                        // mov [bx], al
        &[0xE2, 0xEA],                        // loop repeat
        &[0x8B, 0x1E],
        &word(CGA_TABLE_ADDR + 52 + 70),      // extra entry (0) is slowdown
        &[0x8A, 0x07],                        // mov al, [bx]
        &[0xA2],
        &word(CGA_SLOW_ADDR + 5),             // mov speed_constant, al
        &[0x80, 0x26],
        &word(0x501A),
        &[CGA_VIDEO_AND],                     // and ds:501Ah, allowed modes
        &[0x80, 0x0E],
        &word(0x501A),
        &[CGA_VIDEO_OR],                      // or ds:501Ah, forced mode
        &[0x1F, 0x59, 0x5B, 0x58, 0x9D],      // pop ds/cx/bx/ax; popf
        &[0x8A, 0x26],
        &word(0x505A),                        // mov ah, ds:505Ah ; replaced line
        &[0xC3],                              // retn
    ]
    .concat()
}

fn settings_hook(settings_addr: u16) -> Vec<u8> {
    [&call(SETTINGS0_ADDR, settings_addr)[..], &[0x90]].concat()
}

/// Selection screen input filter, CGA-addressed template. Filters fire plus
/// left/right so held inputs do not repeat on the select screens.
fn select_template() -> Vec<u8> {
    [
        &[0x00][..],                 // filter variable storage
        &call(CGA_SELECT_ADDR + 1, 0x6046), // call joystick poll (+1)
        &[0x9C, 0x50],               // pushf; push ax
        &[0xA0],
        &word(0x538E),               // mov al, input_bitfield
        &[0x8A, 0xE0],               // mov ah, al
        &[0x22, 0x06],
        &word(CGA_SELECT_ADDR),      // and al, filter
        &[0xA2],
        &word(0x538E),               // mov input_bitfield, al
        &[0x80, 0xE4, 0x83],         // and ah, 83h ; filter fire, left, right
        &[0xF6, 0xD4],               // not ah
        &[0x88, 0x26],
        &word(CGA_SELECT_ADDR),      // mov filter, ah
        &[0x58, 0x9D],               // pop ax; popf
        &[0xC3],                     // retn
    ]
    .concat()
}

// Payload offsets of the marked words, as laid out by the builders above.
const TABLE_STRING_PTRS: usize = 54; // 11 slowdown string pointers
const TABLE_SETTINGS_PTRS: usize = 52 + 70; // 7 settings pointers
const TABLE_VIDEO_DEFAULT: usize = 52 + 2 * 12;
const SETTINGS_TABLE_REF_A: usize = 18;
const SETTINGS_TABLE_REF_B: usize = 36;
const SETTINGS_SPEED_REF: usize = 41;
const SETTINGS_VIDEO_AND: usize = 47;
const SETTINGS_VIDEO_OR: usize = 52;
const SELECT_POLL_CALL: usize = 2;
const SELECT_FILTER_REF_A: usize = 13;
const SELECT_FILTER_REF_B: usize = 25;

/// Relocation deriving the EGA menu table from the CGA template.
fn table_relocation() -> Relocation {
    let delta = i32::from(EGA_TABLE_ADDR) - i32::from(CGA_TABLE_ADDR);
    Relocation::new()
        .shift_words(TABLE_STRING_PTRS, 11, delta)
        .shift_words(TABLE_SETTINGS_PTRS, 7, delta)
        .set_byte(TABLE_VIDEO_DEFAULT, EGA_VIDEO_DEFAULT)
}

/// Relocation deriving the EGA settings routine from the CGA template.
fn settings_relocation() -> Relocation {
    let table_delta = i32::from(EGA_TABLE_ADDR) - i32::from(CGA_TABLE_ADDR);
    let slow_delta = i32::from(EGA_SLOW_ADDR) - i32::from(CGA_SLOW_ADDR);
    Relocation::new()
        .shift(SETTINGS_TABLE_REF_A, table_delta)
        .shift(SETTINGS_TABLE_REF_B, table_delta)
        .shift(SETTINGS_SPEED_REF, slow_delta)
        .set_byte(SETTINGS_VIDEO_AND, EGA_VIDEO_AND)
        .set_byte(SETTINGS_VIDEO_OR, EGA_VIDEO_OR)
}

/// Relocation deriving the EGA select filter from the CGA template.
///
/// The poll call targets a fixed routine, so its rel16 shifts by the negated
/// delta when the call site moves; the filter variable references move with
/// the routine and shift forward.
fn select_relocation() -> Relocation {
    let delta = i32::from(EGA_SELECT_ADDR) - i32::from(CGA_SELECT_ADDR);
    Relocation::new()
        .shift(SELECT_POLL_CALL, -delta)
        .shift(SELECT_FILTER_REF_A, delta)
        .shift(SELECT_FILTER_REF_B, delta)
}

/// Reference to the new text table, replacing uses of the original at 501Ah.
fn table_text_ref(table_addr: u16) -> Vec<u8> {
    word(table_addr + 52).to_vec()
}

/// Reference to the new settings pointer table, replacing uses of the
/// original at 5048h.
fn table_settings_ref(table_addr: u16) -> Vec<u8> {
    word(table_addr + 52 + 70).to_vec()
}

/// Assemble one build's set from its payloads and placements.
#[allow(clippy::too_many_arguments)]
fn assemble(
    slow_file: u64,
    slow_addr: u16,
    table_file: u64,
    table_addr: u16,
    table: Vec<u8>,
    settings_file: u64,
    settings_addr: u16,
    settings: Vec<u8>,
    select_file: u64,
    select_addr: u16,
    select: Vec<u8>,
) -> Result<PatchSet> {
    let six = vec![6u8];
    let mut records = vec![
        // slowdown
        PatchRecord::new(slow_file, slow()),
        PatchRecord::new(SLOW0_FILE, slow_hook(slow_addr)),
        // settings table
        PatchRecord::new(table_file, table),
        // increasing index of last table entry 5 -> 6
        PatchRecord::new(0x874B, six.clone()),
        PatchRecord::new(0x879A, six.clone()),
        PatchRecord::new(0x882D, six),
        // references to the original text table (501Ah) and settings
        // pointer table (5048h), redirected to the new table
        PatchRecord::new(0x870D, table_text_ref(table_addr)),
        PatchRecord::new(0x87B5, table_settings_ref(table_addr)),
        PatchRecord::new(0x87CF, table_settings_ref(table_addr)),
        // settings finalization
        PatchRecord::new(settings_file, settings),
        PatchRecord::new(SETTINGS0_FILE, settings_hook(settings_addr)),
        // selection screen joystick input filter
        PatchRecord::new(select_file, select),
    ];
    for (hook_addr, hook_file) in SELECT_HOOKS {
        records.push(PatchRecord::new(
            hook_file,
            call(hook_addr, select_addr + 1).to_vec(),
        ));
    }
    PatchSet::new(records)
}

/// The CGA/Tandy build of the Mega Man 3 patch, straight from the templates.
pub fn cga_patch_set() -> Result<PatchSet> {
    assemble(
        CGA_SLOW_FILE,
        CGA_SLOW_ADDR,
        CGA_TABLE_FILE,
        CGA_TABLE_ADDR,
        table_template(),
        CGA_SETTINGS_FILE,
        CGA_SETTINGS_ADDR,
        settings_template(),
        CGA_SELECT_FILE,
        CGA_SELECT_ADDR,
        select_template(),
    )
}

/// The EGA build of the Mega Man 3 patch, with payloads derived from the
/// CGA templates by relocation.
pub fn ega_patch_set() -> Result<PatchSet> {
    let table = table_relocation().derive(&table_template())?;
    let settings = settings_relocation().derive(&settings_template())?;
    let select = select_relocation().derive(&select_template())?;
    assemble(
        EGA_SLOW_FILE,
        EGA_SLOW_ADDR,
        EGA_TABLE_FILE,
        EGA_TABLE_ADDR,
        table,
        EGA_SETTINGS_FILE,
        EGA_SETTINGS_ADDR,
        settings,
        EGA_SELECT_FILE,
        EGA_SELECT_ADDR,
        select,
    )
}
