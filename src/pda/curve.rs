//! Ed25519 point-decompression test
//!
//! A program derived address must not be a valid Ed25519 public key, so
//! deriving one needs exactly one piece of curve math: deciding whether
//! 32 candidate bytes decompress to a curve point. The bytes encode a
//! sign bit (bit 255) and y little-endian; the point is on the curve when
//! x² = (y² − 1)/(d·y² + 1) has a square root mod p = 2²⁵⁵ − 19.
//!
//! Field elements use the unpacked 51-bit-limb representation: five u64
//! limbs of 51 bits each, products accumulated in u128, with the 2²⁵⁵ ≡ 19
//! identity folding the high half back into the low. The two curve
//! constants (d = −121665/121666 and √−1 = 2^((p−1)/4)) are derived once
//! from those definitions rather than hardcoded.

use once_cell::sync::Lazy;

const LOW_51_BIT_MASK: u64 = (1u64 << 51) - 1;

/// p − 2, little-endian; exponent for Fermat inversion
const P_MINUS_2: [u8; 32] = {
    let mut exponent = [0xff; 32];
    exponent[0] = 0xeb;
    exponent[31] = 0x7f;
    exponent
};

/// (p + 3)/8, little-endian; exponent for the square-root candidate
const P_PLUS_3_OVER_8: [u8; 32] = {
    let mut exponent = [0xff; 32];
    exponent[0] = 0xfe;
    exponent[31] = 0x0f;
    exponent
};

/// (p − 1)/4, little-endian; 2 to this power is a square root of −1
const P_MINUS_1_OVER_4: [u8; 32] = {
    let mut exponent = [0xff; 32];
    exponent[0] = 0xfb;
    exponent[31] = 0x1f;
    exponent
};

/// The Edwards curve constant d = −121665/121666 mod p
static EDWARDS_D: Lazy<FieldElement> = Lazy::new(|| {
    let minus_121665 = FieldElement::ZERO.sub(&FieldElement::from_u64(121665));
    minus_121665.mul(&FieldElement::from_u64(121666).invert())
});

/// A square root of −1 mod p (p ≡ 1 mod 4, so one exists)
static SQRT_MINUS_1: Lazy<FieldElement> =
    Lazy::new(|| FieldElement::from_u64(2).pow(&P_MINUS_1_OVER_4));

/// An element of GF(2²⁵⁵ − 19), five 51-bit limbs, little-endian
#[derive(Debug, Clone, Copy)]
struct FieldElement([u64; 5]);

impl FieldElement {
    const ZERO: FieldElement = FieldElement([0; 5]);
    const ONE: FieldElement = FieldElement([1, 0, 0, 0, 0]);

    fn from_u64(value: u64) -> Self {
        FieldElement([value & LOW_51_BIT_MASK, value >> 51, 0, 0, 0])
    }

    /// Load 32 little-endian bytes, ignoring the high (sign) bit
    fn from_bytes(bytes: &[u8; 32]) -> Self {
        let load8 = |input: &[u8]| u64::from_le_bytes(input[..8].try_into().unwrap());
        FieldElement([
            load8(&bytes[0..]) & LOW_51_BIT_MASK,
            (load8(&bytes[6..]) >> 3) & LOW_51_BIT_MASK,
            (load8(&bytes[12..]) >> 6) & LOW_51_BIT_MASK,
            (load8(&bytes[19..]) >> 1) & LOW_51_BIT_MASK,
            (load8(&bytes[24..]) >> 12) & LOW_51_BIT_MASK,
        ])
    }

    /// Serialize to 32 little-endian bytes, fully reduced mod p
    fn to_bytes(self) -> [u8; 32] {
        let mut limbs = Self::carry(self.0).0;

        // q = 1 exactly when the value is >= p; computed by propagating
        // the carry of (value + 19) out of bit 255
        let mut q = (limbs[0] + 19) >> 51;
        q = (limbs[1] + q) >> 51;
        q = (limbs[2] + q) >> 51;
        q = (limbs[3] + q) >> 51;
        q = (limbs[4] + q) >> 51;

        // subtract q*p by adding q*19 and dropping bit 255
        limbs[0] += 19 * q;
        let mut carry = limbs[0] >> 51;
        limbs[0] &= LOW_51_BIT_MASK;
        for limb in limbs.iter_mut().skip(1) {
            *limb += carry;
            carry = *limb >> 51;
            *limb &= LOW_51_BIT_MASK;
        }

        let mut bytes = [0u8; 32];
        bytes[0] = limbs[0] as u8;
        bytes[1] = (limbs[0] >> 8) as u8;
        bytes[2] = (limbs[0] >> 16) as u8;
        bytes[3] = (limbs[0] >> 24) as u8;
        bytes[4] = (limbs[0] >> 32) as u8;
        bytes[5] = (limbs[0] >> 40) as u8;
        bytes[6] = ((limbs[0] >> 48) | (limbs[1] << 3)) as u8;
        bytes[7] = (limbs[1] >> 5) as u8;
        bytes[8] = (limbs[1] >> 13) as u8;
        bytes[9] = (limbs[1] >> 21) as u8;
        bytes[10] = (limbs[1] >> 29) as u8;
        bytes[11] = (limbs[1] >> 37) as u8;
        bytes[12] = ((limbs[1] >> 45) | (limbs[2] << 6)) as u8;
        bytes[13] = (limbs[2] >> 2) as u8;
        bytes[14] = (limbs[2] >> 10) as u8;
        bytes[15] = (limbs[2] >> 18) as u8;
        bytes[16] = (limbs[2] >> 26) as u8;
        bytes[17] = (limbs[2] >> 34) as u8;
        bytes[18] = (limbs[2] >> 42) as u8;
        bytes[19] = ((limbs[2] >> 50) | (limbs[3] << 1)) as u8;
        bytes[20] = (limbs[3] >> 7) as u8;
        bytes[21] = (limbs[3] >> 15) as u8;
        bytes[22] = (limbs[3] >> 23) as u8;
        bytes[23] = (limbs[3] >> 31) as u8;
        bytes[24] = (limbs[3] >> 39) as u8;
        bytes[25] = ((limbs[3] >> 47) | (limbs[4] << 4)) as u8;
        bytes[26] = (limbs[4] >> 4) as u8;
        bytes[27] = (limbs[4] >> 12) as u8;
        bytes[28] = (limbs[4] >> 20) as u8;
        bytes[29] = (limbs[4] >> 28) as u8;
        bytes[30] = (limbs[4] >> 36) as u8;
        bytes[31] = (limbs[4] >> 44) as u8;
        bytes
    }

    /// One round of carry propagation; keeps limbs below 2⁵² for inputs
    /// below 2⁶⁴ − 2⁵⁷
    fn carry(mut limbs: [u64; 5]) -> Self {
        let c0 = limbs[0] >> 51;
        let c1 = limbs[1] >> 51;
        let c2 = limbs[2] >> 51;
        let c3 = limbs[3] >> 51;
        let c4 = limbs[4] >> 51;
        limbs[0] &= LOW_51_BIT_MASK;
        limbs[1] &= LOW_51_BIT_MASK;
        limbs[2] &= LOW_51_BIT_MASK;
        limbs[3] &= LOW_51_BIT_MASK;
        limbs[4] &= LOW_51_BIT_MASK;
        limbs[0] += c4 * 19;
        limbs[1] += c0;
        limbs[2] += c1;
        limbs[3] += c2;
        limbs[4] += c3;
        FieldElement(limbs)
    }

    fn add(&self, rhs: &FieldElement) -> FieldElement {
        Self::carry([
            self.0[0] + rhs.0[0],
            self.0[1] + rhs.0[1],
            self.0[2] + rhs.0[2],
            self.0[3] + rhs.0[3],
            self.0[4] + rhs.0[4],
        ])
    }

    /// a − b, biased by 16p so no limb underflows
    fn sub(&self, rhs: &FieldElement) -> FieldElement {
        const BIAS_LOW: u64 = 16 * ((1u64 << 51) - 19);
        const BIAS: u64 = 16 * ((1u64 << 51) - 1);
        Self::carry([
            (self.0[0] + BIAS_LOW) - rhs.0[0],
            (self.0[1] + BIAS) - rhs.0[1],
            (self.0[2] + BIAS) - rhs.0[2],
            (self.0[3] + BIAS) - rhs.0[3],
            (self.0[4] + BIAS) - rhs.0[4],
        ])
    }

    fn mul(&self, rhs: &FieldElement) -> FieldElement {
        let a = &self.0;
        let b = &rhs.0;
        let m = |x: u64, y: u64| u128::from(x) * u128::from(y);

        // limbs above the cut wrap around through 2²⁵⁵ ≡ 19
        let b1_19 = b[1] * 19;
        let b2_19 = b[2] * 19;
        let b3_19 = b[3] * 19;
        let b4_19 = b[4] * 19;

        let mut c0 = m(a[0], b[0]) + m(a[4], b1_19) + m(a[3], b2_19) + m(a[2], b3_19) + m(a[1], b4_19);
        let mut c1 = m(a[1], b[0]) + m(a[0], b[1]) + m(a[4], b2_19) + m(a[3], b3_19) + m(a[2], b4_19);
        let mut c2 = m(a[2], b[0]) + m(a[1], b[1]) + m(a[0], b[2]) + m(a[4], b3_19) + m(a[3], b4_19);
        let mut c3 = m(a[3], b[0]) + m(a[2], b[1]) + m(a[1], b[2]) + m(a[0], b[3]) + m(a[4], b4_19);
        let mut c4 = m(a[4], b[0]) + m(a[3], b[1]) + m(a[2], b[2]) + m(a[1], b[3]) + m(a[0], b[4]);

        let mut out = [0u64; 5];
        c1 += (c0 >> 51) as u128;
        out[0] = (c0 as u64) & LOW_51_BIT_MASK;
        c2 += (c1 >> 51) as u128;
        out[1] = (c1 as u64) & LOW_51_BIT_MASK;
        c3 += (c2 >> 51) as u128;
        out[2] = (c2 as u64) & LOW_51_BIT_MASK;
        c4 += (c3 >> 51) as u128;
        out[3] = (c3 as u64) & LOW_51_BIT_MASK;
        let carry = (c4 >> 51) as u64;
        out[4] = (c4 as u64) & LOW_51_BIT_MASK;

        out[0] += carry * 19;
        out[1] += out[0] >> 51;
        out[0] &= LOW_51_BIT_MASK;
        FieldElement(out)
    }

    fn square(&self) -> FieldElement {
        self.mul(self)
    }

    /// Square-and-multiply over a little-endian exponent
    fn pow(&self, exponent_le: &[u8; 32]) -> FieldElement {
        let mut result = FieldElement::ONE;
        for byte in exponent_le.iter().rev() {
            for bit in (0..8).rev() {
                result = result.square();
                if (byte >> bit) & 1 == 1 {
                    result = result.mul(self);
                }
            }
        }
        result
    }

    /// Fermat inversion; maps zero to zero
    fn invert(&self) -> FieldElement {
        self.pow(&P_MINUS_2)
    }

    fn equals(&self, rhs: &FieldElement) -> bool {
        self.to_bytes() == rhs.to_bytes()
    }

    fn is_zero(&self) -> bool {
        self.to_bytes() == [0u8; 32]
    }
}

/// Decide whether 32 candidate bytes are a valid compressed Ed25519 point
pub fn is_on_curve(bytes: &[u8; 32]) -> bool {
    let y = FieldElement::from_bytes(bytes);
    let yy = y.square();
    let u = yy.sub(&FieldElement::ONE);
    let v = yy.mul(&EDWARDS_D).add(&FieldElement::ONE);

    // candidate x = (u/v)^((p+3)/8), corrected by √−1 when x² lands on −u/v
    let xx = u.mul(&v.invert());
    let mut x = xx.pow(&P_PLUS_3_OVER_8);
    if !x.square().equals(&xx) {
        x = x.mul(&SQRT_MINUS_1);
    }
    if !x.square().equals(&xx) {
        return false;
    }
    // x = 0 cannot carry the sign bit; that compressed form is invalid
    if x.is_zero() && bytes[31] >> 7 == 1 {
        return false;
    }

    // the curve equation must hold: y² − x² = 1 + d·x²·y²
    let lhs = yy.sub(&x.square());
    let rhs = FieldElement::ONE.add(&EDWARDS_D.mul(&x.square()).mul(&yy));
    lhs.equals(&rhs)
}
