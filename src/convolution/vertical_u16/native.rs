use crate::convolution::{CoefficientTable, FixedPointCodec};
use crate::LineBuffer;

#[inline(always)]
pub(crate) fn resize_line_v(
    table: &CoefficientTable,
    codec: FixedPointCodec,
    src: &LineBuffer<u16>,
    dst: &mut [u16],
    i: usize,
    left: usize,
    right: usize,
) {
    let top = table.left()[i];
    let coeffs = table.coeffs_i16(i);
    for (dst_pixel, j) in dst[left..right].iter_mut().zip(left..) {
        let mut accum = 0i32;
        for (&coeff, y) in coeffs.iter().zip(top..) {
            let x = src.row(y)[j];
            accum = accum.wrapping_add(coeff as i32 * FixedPointCodec::unpack(x));
        }
        *dst_pixel = codec.pack(accum);
    }
}
