#![no_main]
#[macro_use] extern crate libfuzzer_sys;
extern crate unixar_core;

use unixar_core::Header;

fuzz_target!(|data: &[u8]| {
    let _magic = unixar_core::check_magic(data);

    if let Ok(header) = Header::decode(data) {
        let _name = header.display_name();
        if let Ok(member) = header.member() {
            // Anything decodable with a well formed name must encode again
            if let Ok(encoded) = Header::encode(&member) {
                assert_eq!(encoded.member(), Ok(member));
            }
        }
    }
});
