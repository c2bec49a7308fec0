//! Script opcode table

// push value
pub const OP_0: u8 = 0x00;
pub const OP_FALSE: u8 = OP_0;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_1NEGATE: u8 = 0x4f;
pub const OP_RESERVED: u8 = 0x50;
pub const OP_1: u8 = 0x51;
pub const OP_TRUE: u8 = OP_1;
pub const OP_2: u8 = 0x52;
pub const OP_3: u8 = 0x53;
pub const OP_4: u8 = 0x54;
pub const OP_5: u8 = 0x55;
pub const OP_6: u8 = 0x56;
pub const OP_7: u8 = 0x57;
pub const OP_8: u8 = 0x58;
pub const OP_9: u8 = 0x59;
pub const OP_10: u8 = 0x5a;
pub const OP_11: u8 = 0x5b;
pub const OP_12: u8 = 0x5c;
pub const OP_13: u8 = 0x5d;
pub const OP_14: u8 = 0x5e;
pub const OP_15: u8 = 0x5f;
pub const OP_16: u8 = 0x60;

// control
pub const OP_NOP: u8 = 0x61;
pub const OP_VER: u8 = 0x62;
pub const OP_IF: u8 = 0x63;
pub const OP_NOTIF: u8 = 0x64;
pub const OP_VERIF: u8 = 0x65;
pub const OP_VERNOTIF: u8 = 0x66;
pub const OP_ELSE: u8 = 0x67;
pub const OP_ENDIF: u8 = 0x68;
pub const OP_VERIFY: u8 = 0x69;
pub const OP_RETURN: u8 = 0x6a;

// stack ops
pub const OP_TOALTSTACK: u8 = 0x6b;
pub const OP_FROMALTSTACK: u8 = 0x6c;
pub const OP_2DROP: u8 = 0x6d;
pub const OP_2DUP: u8 = 0x6e;
pub const OP_3DUP: u8 = 0x6f;
pub const OP_2OVER: u8 = 0x70;
pub const OP_2ROT: u8 = 0x71;
pub const OP_2SWAP: u8 = 0x72;
pub const OP_IFDUP: u8 = 0x73;
pub const OP_DEPTH: u8 = 0x74;
pub const OP_DROP: u8 = 0x75;
pub const OP_DUP: u8 = 0x76;
pub const OP_NIP: u8 = 0x77;
pub const OP_OVER: u8 = 0x78;
pub const OP_PICK: u8 = 0x79;
pub const OP_ROLL: u8 = 0x7a;
pub const OP_ROT: u8 = 0x7b;
pub const OP_SWAP: u8 = 0x7c;
pub const OP_TUCK: u8 = 0x7d;

// splice ops
pub const OP_CAT: u8 = 0x7e;
pub const OP_SUBSTR: u8 = 0x7f;
pub const OP_LEFT: u8 = 0x80;
pub const OP_RIGHT: u8 = 0x81;
pub const OP_SIZE: u8 = 0x82;

// bit logic
pub const OP_INVERT: u8 = 0x83;
pub const OP_AND: u8 = 0x84;
pub const OP_OR: u8 = 0x85;
pub const OP_XOR: u8 = 0x86;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_RESERVED1: u8 = 0x89;
pub const OP_RESERVED2: u8 = 0x8a;

// numeric
pub const OP_1ADD: u8 = 0x8b;
pub const OP_1SUB: u8 = 0x8c;
pub const OP_2MUL: u8 = 0x8d;
pub const OP_2DIV: u8 = 0x8e;
pub const OP_NEGATE: u8 = 0x8f;
pub const OP_ABS: u8 = 0x90;
pub const OP_NOT: u8 = 0x91;
pub const OP_0NOTEQUAL: u8 = 0x92;
pub const OP_ADD: u8 = 0x93;
pub const OP_SUB: u8 = 0x94;
pub const OP_MUL: u8 = 0x95;
pub const OP_DIV: u8 = 0x96;
pub const OP_MOD: u8 = 0x97;
pub const OP_LSHIFT: u8 = 0x98;
pub const OP_RSHIFT: u8 = 0x99;
pub const OP_BOOLAND: u8 = 0x9a;
pub const OP_BOOLOR: u8 = 0x9b;
pub const OP_NUMEQUAL: u8 = 0x9c;
pub const OP_NUMEQUALVERIFY: u8 = 0x9d;
pub const OP_NUMNOTEQUAL: u8 = 0x9e;
pub const OP_LESSTHAN: u8 = 0x9f;
pub const OP_GREATERTHAN: u8 = 0xa0;
pub const OP_LESSTHANOREQUAL: u8 = 0xa1;
pub const OP_GREATERTHANOREQUAL: u8 = 0xa2;
pub const OP_MIN: u8 = 0xa3;
pub const OP_MAX: u8 = 0xa4;
pub const OP_WITHIN: u8 = 0xa5;

// crypto
pub const OP_RIPEMD160: u8 = 0xa6;
pub const OP_SHA1: u8 = 0xa7;
pub const OP_SHA256: u8 = 0xa8;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_HASH256: u8 = 0xaa;
pub const OP_CODESEPARATOR: u8 = 0xab;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_CHECKSIGVERIFY: u8 = 0xad;
pub const OP_CHECKMULTISIG: u8 = 0xae;
pub const OP_CHECKMULTISIGVERIFY: u8 = 0xaf;

// expansion
pub const OP_NOP1: u8 = 0xb0;
pub const OP_NOP2: u8 = 0xb1;
pub const OP_CHECKLOCKTIMEVERIFY: u8 = OP_NOP2;
pub const OP_NOP3: u8 = 0xb2;
pub const OP_NOP4: u8 = 0xb3;
pub const OP_NOP5: u8 = 0xb4;
pub const OP_NOP6: u8 = 0xb5;
pub const OP_NOP7: u8 = 0xb6;
pub const OP_NOP8: u8 = 0xb7;
pub const OP_NOP9: u8 = 0xb8;
pub const OP_NOP10: u8 = 0xb9;

pub const OP_INVALIDOPCODE: u8 = 0xff;

/// Opcodes that abort evaluation wherever they appear, even in a skipped branch
pub fn is_disabled(op: u8) -> bool {
    matches!(
        op,
        OP_CAT
            | OP_SUBSTR
            | OP_LEFT
            | OP_RIGHT
            | OP_INVERT
            | OP_AND
            | OP_OR
            | OP_XOR
            | OP_2MUL
            | OP_2DIV
            | OP_MUL
            | OP_DIV
            | OP_MOD
            | OP_LSHIFT
            | OP_RSHIFT
    )
}

/// Human-readable name without the `OP_` prefix, `None` for unassigned bytes.
/// Small integers are named by their value ("0", "1NEGATE", "1".."16").
pub fn name(op: u8) -> Option<&'static str> {
    Some(match op {
        OP_0 => "0",
        OP_PUSHDATA1 => "PUSHDATA1",
        OP_PUSHDATA2 => "PUSHDATA2",
        OP_PUSHDATA4 => "PUSHDATA4",
        OP_1NEGATE => "1NEGATE",
        OP_RESERVED => "RESERVED",
        OP_1 => "1",
        OP_2 => "2",
        OP_3 => "3",
        OP_4 => "4",
        OP_5 => "5",
        OP_6 => "6",
        OP_7 => "7",
        OP_8 => "8",
        OP_9 => "9",
        OP_10 => "10",
        OP_11 => "11",
        OP_12 => "12",
        OP_13 => "13",
        OP_14 => "14",
        OP_15 => "15",
        OP_16 => "16",
        OP_NOP => "NOP",
        OP_VER => "VER",
        OP_IF => "IF",
        OP_NOTIF => "NOTIF",
        OP_VERIF => "VERIF",
        OP_VERNOTIF => "VERNOTIF",
        OP_ELSE => "ELSE",
        OP_ENDIF => "ENDIF",
        OP_VERIFY => "VERIFY",
        OP_RETURN => "RETURN",
        OP_TOALTSTACK => "TOALTSTACK",
        OP_FROMALTSTACK => "FROMALTSTACK",
        OP_2DROP => "2DROP",
        OP_2DUP => "2DUP",
        OP_3DUP => "3DUP",
        OP_2OVER => "2OVER",
        OP_2ROT => "2ROT",
        OP_2SWAP => "2SWAP",
        OP_IFDUP => "IFDUP",
        OP_DEPTH => "DEPTH",
        OP_DROP => "DROP",
        OP_DUP => "DUP",
        OP_NIP => "NIP",
        OP_OVER => "OVER",
        OP_PICK => "PICK",
        OP_ROLL => "ROLL",
        OP_ROT => "ROT",
        OP_SWAP => "SWAP",
        OP_TUCK => "TUCK",
        OP_CAT => "CAT",
        OP_SUBSTR => "SUBSTR",
        OP_LEFT => "LEFT",
        OP_RIGHT => "RIGHT",
        OP_SIZE => "SIZE",
        OP_INVERT => "INVERT",
        OP_AND => "AND",
        OP_OR => "OR",
        OP_XOR => "XOR",
        OP_EQUAL => "EQUAL",
        OP_EQUALVERIFY => "EQUALVERIFY",
        OP_RESERVED1 => "RESERVED1",
        OP_RESERVED2 => "RESERVED2",
        OP_1ADD => "1ADD",
        OP_1SUB => "1SUB",
        OP_2MUL => "2MUL",
        OP_2DIV => "2DIV",
        OP_NEGATE => "NEGATE",
        OP_ABS => "ABS",
        OP_NOT => "NOT",
        OP_0NOTEQUAL => "0NOTEQUAL",
        OP_ADD => "ADD",
        OP_SUB => "SUB",
        OP_MUL => "MUL",
        OP_DIV => "DIV",
        OP_MOD => "MOD",
        OP_LSHIFT => "LSHIFT",
        OP_RSHIFT => "RSHIFT",
        OP_BOOLAND => "BOOLAND",
        OP_BOOLOR => "BOOLOR",
        OP_NUMEQUAL => "NUMEQUAL",
        OP_NUMEQUALVERIFY => "NUMEQUALVERIFY",
        OP_NUMNOTEQUAL => "NUMNOTEQUAL",
        OP_LESSTHAN => "LESSTHAN",
        OP_GREATERTHAN => "GREATERTHAN",
        OP_LESSTHANOREQUAL => "LESSTHANOREQUAL",
        OP_GREATERTHANOREQUAL => "GREATERTHANOREQUAL",
        OP_MIN => "MIN",
        OP_MAX => "MAX",
        OP_WITHIN => "WITHIN",
        OP_RIPEMD160 => "RIPEMD160",
        OP_SHA1 => "SHA1",
        OP_SHA256 => "SHA256",
        OP_HASH160 => "HASH160",
        OP_HASH256 => "HASH256",
        OP_CODESEPARATOR => "CODESEPARATOR",
        OP_CHECKSIG => "CHECKSIG",
        OP_CHECKSIGVERIFY => "CHECKSIGVERIFY",
        OP_CHECKMULTISIG => "CHECKMULTISIG",
        OP_CHECKMULTISIGVERIFY => "CHECKMULTISIGVERIFY",
        OP_NOP1 => "NOP1",
        OP_CHECKLOCKTIMEVERIFY => "CHECKLOCKTIMEVERIFY",
        OP_NOP3 => "NOP3",
        OP_NOP4 => "NOP4",
        OP_NOP5 => "NOP5",
        OP_NOP6 => "NOP6",
        OP_NOP7 => "NOP7",
        OP_NOP8 => "NOP8",
        OP_NOP9 => "NOP9",
        OP_NOP10 => "NOP10",
        OP_INVALIDOPCODE => "INVALIDOPCODE",
        _ => return None,
    })
}

/// Reverse of [`name`]; accepts names with or without the `OP_` prefix.
pub fn from_name(name: &str) -> Option<u8> {
    let bare = name.strip_prefix("OP_").unwrap_or(name);
    match bare {
        "FALSE" => return Some(OP_0),
        "TRUE" => return Some(OP_1),
        "NOP2" => return Some(OP_NOP2),
        _ => {}
    }
    (0..=u8::MAX).find(|&op| self::name(op) == Some(bare))
}

/// Value pushed by `OP_0`, `OP_1NEGATE` or `OP_1`..`OP_16`
pub fn decode_from_op_n(op: u8) -> Option<i32> {
    match op {
        OP_0 => Some(0),
        OP_1NEGATE => Some(-1),
        OP_1..=OP_16 => Some((op - OP_1) as i32 + 1),
        _ => None,
    }
}

/// Opcode that pushes `n`, for `-1 <= n <= 16`
pub fn encode_to_op_n(n: i32) -> Option<u8> {
    match n {
        -1 => Some(OP_1NEGATE),
        0 => Some(OP_0),
        1..=16 => Some(OP_1 + (n - 1) as u8),
        _ => None,
    }
}
