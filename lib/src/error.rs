// trailer-core - crate-wide error taxonomy
// Copyright (C) 2016, 2017 Matthias Beyer <mail@beyermatthias.de>
// Copyright (C) 2016, 2017 Julian Ganz <neither@nut.email>
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//

error_chain! {
    foreign_links {
        Io(::std::io::Error);
    }

    errors {
        StdinReadError {
            description("cannot read standard input")
            display("could not read standard input to completion")
        }

        LockCreateFailed(path: String) {
            description("cannot create the housekeeping lock file")
            display("could not create or commit the lock file at '{}'", path)
        }

        LockAlreadyHeld(host: String, pid: u32) {
            description("a housekeeping lock is already held")
            display("gc is already running on machine '{}' pid {} (use --force if not)", host, pid)
        }

        InvalidExpiry(var: String, value: String) {
            description("configured expiry date resolves to the future")
            display("invalid {}: '{}'", var, value)
        }
    }
}
