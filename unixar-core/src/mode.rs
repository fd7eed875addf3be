use bitflags::bitflags;

bitflags! {
    /// Unix mode bits as stored in the header's octal mode field
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Mode: u32 {
        const SETUID = 0o4000;
        const SETGID = 0o2000;
        const STICKY = 0o1000;

        const USER_READ = 0o400;
        const USER_WRITE = 0o200;
        const USER_EXEC = 0o100;
        const GROUP_READ = 0o040;
        const GROUP_WRITE = 0o020;
        const GROUP_EXEC = 0o010;
        const OTHER_READ = 0o004;
        const OTHER_WRITE = 0o002;
        const OTHER_EXEC = 0o001;

        /// Permission bits, including setuid, setgid and sticky
        const PERM = 0o7777;

        const KIND = 0o170000;
        const FILE = 0o100000;
        const DIR = 0o040000;
        const SYMLINK = 0o120000;
    }
}

impl Mode {
    pub fn perm(self) -> Mode {
        self & Mode::PERM
    }

    pub fn kind(self) -> Mode {
        self & Mode::KIND
    }
}
