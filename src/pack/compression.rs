// SPDX-FileCopyrightText: 2026 Joshua Goins <josh@redstrate.com>
// SPDX-License-Identifier: GPL-3.0-or-later

use std::ptr::null_mut;

use libz_sys::*;

/// Inflates a raw DEFLATE stream (no zlib or gzip wrapper), as used for every
/// compressed SqPack block.
pub fn inflate_raw(in_data: &mut [u8], out_data: &mut [u8]) -> Result<(), ()> {
    unsafe {
        let mut strm: z_stream = std::mem::zeroed();

        let ret = inflateInit2_(
            &mut strm,
            -15,
            zlibVersion(),
            core::mem::size_of::<z_stream>() as i32,
        );
        if ret != Z_OK {
            return Err(());
        }

        strm.next_in = in_data.as_mut_ptr();
        strm.avail_in = in_data.len() as u32;
        strm.next_out = out_data.as_mut_ptr();
        strm.avail_out = out_data.len() as u32;

        let ret = inflate(&mut strm, Z_NO_FLUSH);
        inflateEnd(&mut strm);

        if ret != Z_STREAM_END {
            return Err(());
        }

        Ok(())
    }
}
