//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//


use crate::consts::option;

macro_rules! telnet_options {
    ($($(#[$doc:meta])* $variant:ident = $code:path => $name:literal,)*) => {
        ///
        /// [Telnet Options](https://www.iana.org/assignments/telnet-options/telnet-options.xhtml)
        /// known by name. Any other code is carried as [`TelnetOption::Unknown`].
        ///
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
        pub enum TelnetOption {
            $($(#[$doc])* $variant,)*
            /// Option code without a registered name
            Unknown(u8),
        }

        impl TelnetOption {
            /// Wire value of this option
            pub fn to_u8(self) -> u8 {
                match self {
                    $(TelnetOption::$variant => $code,)*
                    TelnetOption::Unknown(byte) => byte,
                }
            }

            /// Decode an option byte
            pub fn from_u8(byte: u8) -> Self {
                match byte {
                    $($code => TelnetOption::$variant,)*
                    byte => TelnetOption::Unknown(byte),
                }
            }

            /// Registered name of the option, if it has one
            pub fn name(self) -> Option<&'static str> {
                match self {
                    $(TelnetOption::$variant => Some($name),)*
                    TelnetOption::Unknown(_) => None,
                }
            }
        }
    };
}

telnet_options! {
    /// Binary Transmission [RFC856](https://tools.ietf.org/html/rfc856)
    TransmitBinary = option::BINARY => "TRANSMIT-BINARY",
    /// Echo [RFC857](https://tools.ietf.org/html/rfc857)
    Echo = option::ECHO => "ECHO",
    /// Reconnection
    Reconnection = option::RCP => "RECONNECTION",
    /// Suppress Go Ahead [RFC858](https://tools.ietf.org/html/rfc858)
    SuppressGoAhead = option::SGA => "SUPPRESS-GO-AHEAD",
    /// Approx Message Size Negotiation
    ApproxMessageSize = option::NAMS => "APPROX-MESSAGE-SIZE",
    /// Status [RFC859](https://tools.ietf.org/html/rfc859)
    Status = option::STATUS => "STATUS",
    /// Timing Mark [RFC860](https://tools.ietf.org/html/rfc860)
    TimingMark = option::TM => "TIMING-MARK",
    /// Remote Controlled Trans and Echo [RFC726](https://tools.ietf.org/html/rfc726)
    RemoteControlledEcho = option::RCTE => "RCTE",
    /// Output Line Width
    OutputLineWidth = option::NAOL => "NAOL",
    /// Output Page Size
    OutputPageSize = option::NAOP => "NAOP",
    /// Output Carriage-Return Disposition [RFC652](https://tools.ietf.org/html/rfc652)
    OutputCarriageReturn = option::NAOCRD => "NAOCRD",
    /// Output Horizontal Tab Stops [RFC653](https://tools.ietf.org/html/rfc653)
    OutputHorizontalTabStops = option::NAOHTS => "NAOHTS",
    /// Output Horizontal Tab Disposition [RFC654](https://tools.ietf.org/html/rfc654)
    OutputHorizontalTabs = option::NAOHTD => "NAOHTD",
    /// Output Formfeed Disposition [RFC655](https://tools.ietf.org/html/rfc655)
    OutputFormFeed = option::NAOFFD => "NAOFFD",
    /// Output Vertical Tabstops [RFC656](https://tools.ietf.org/html/rfc656)
    OutputVerticalTabStops = option::NAOVTS => "NAOVTS",
    /// Output Vertical Tab Disposition [RFC657](https://tools.ietf.org/html/rfc657)
    OutputVerticalTabs = option::NAOVTD => "NAOVTD",
    /// Output Linefeed Disposition [RFC658](https://tools.ietf.org/html/rfc658)
    OutputLineFeed = option::NAOLFD => "NAOLFD",
    /// Extended ASCII [RFC698](https://tools.ietf.org/html/rfc698)
    ExtendedAscii = option::XASCII => "EXTEND-ASCII",
    /// Logout [RFC727](https://tools.ietf.org/html/rfc727)
    Logout = option::LOGOUT => "LOGOUT",
    /// Byte Macro [RFC735](https://tools.ietf.org/html/rfc735)
    ByteMacro = option::BM => "BYTE-MACRO",
    /// Data Entry Terminal [RFC1043](https://tools.ietf.org/html/rfc1043)
    DataEntryTerminal = option::DET => "DATA-ENTRY-TERMINAL",
    /// SUPDUP [RFC736](https://tools.ietf.org/html/rfc736)
    Supdup = option::SUPDUP => "SUPDUP",
    /// SUPDUP Output [RFC749](https://tools.ietf.org/html/rfc749)
    SupdupOutput = option::SUPDUP_OUTPUT => "SUPDUP-OUTPUT",
    /// Send Location [RFC779](https://tools.ietf.org/html/rfc779)
    SendLocation = option::SNDLOC => "SEND-LOCATION",
    /// Terminal Type [RFC1091](https://tools.ietf.org/html/rfc1091)
    TerminalType = option::TTYPE => "TERMINAL-TYPE",
    /// End of Record [RFC885](https://tools.ietf.org/html/rfc885)
    EndOfRecord = option::EOR => "END-OF-RECORD",
    /// TACACS User Identification [RFC927](https://tools.ietf.org/html/rfc927)
    TacacsUserId = option::TUID => "TUID",
    /// Output Marking [RFC933](https://tools.ietf.org/html/rfc933)
    OutputMarking = option::OUTMRK => "OUTMRK",
    /// Terminal Location Number [RFC946](https://tools.ietf.org/html/rfc946)
    TerminalLocation = option::TTYLOC => "TTYLOC",
    /// Telnet 3270 Regime [RFC1041](https://tools.ietf.org/html/rfc1041)
    Tn3270Regime = option::OPT3270REGIME => "3270-REGIME",
    /// X.3 PAD [RFC1053](https://tools.ietf.org/html/rfc1053)
    X3Pad = option::X3PAD => "X.3-PAD",
    /// Negotiate About Window Size [RFC1073](https://tools.ietf.org/html/rfc1073)
    WindowSize = option::NAWS => "NAWS",
    /// Terminal Speed [RFC1079](https://tools.ietf.org/html/rfc1079)
    TerminalSpeed = option::TSPEED => "TERMINAL-SPEED",
    /// Remote Flow Control [RFC1372](https://tools.ietf.org/html/rfc1372)
    RemoteFlowControl = option::LFLOW => "TOGGLE-FLOW-CONTROL",
    /// Linemode [RFC1184](https://tools.ietf.org/html/rfc1184)
    Linemode = option::LINEMODE => "LINEMODE",
    /// X Display Location [RFC1096](https://tools.ietf.org/html/rfc1096)
    XDisplayLocation = option::XDISPLOC => "X-DISPLAY-LOCATION",
    /// Environment [RFC1408](https://tools.ietf.org/html/rfc1408)
    Environment = option::OLD_ENVIRONMENT => "OLD-ENVIRON",
    /// Authentication [RFC2941](https://tools.ietf.org/html/rfc2941)
    Authentication = option::AUTHENTICATION => "AUTHENTICATION",
    /// Encryption [RFC2946](https://tools.ietf.org/html/rfc2946)
    Encryption = option::ENCRYPTION => "ENCRYPT",
    /// New Environment [RFC1572](https://tools.ietf.org/html/rfc1572)
    NewEnvironment = option::NEW_ENVIRONMENT => "NEW-ENVIRON",
    /// Extended-Options-List [RFC861](https://tools.ietf.org/html/rfc861)
    ExtendedOptionsList = option::EXOPL => "EXTENDED-OPTIONS-LIST",
}

impl std::fmt::Display for TelnetOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "Option #{}", self.to_u8()),
        }
    }
}

impl From<u8> for TelnetOption {
    fn from(byte: u8) -> Self {
        Self::from_u8(byte)
    }
}

impl From<TelnetOption> for u8 {
    fn from(option: TelnetOption) -> Self {
        option.to_u8()
    }
}

/// Diagnostic name of an option code, `"Option #N"` when it has none.
pub fn option_name(code: u8) -> String {
    TelnetOption::from_u8(code).to_string()
}

/// Which end of the connection performs an option
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TelnetSide {
    /// We perform the option (negotiated with WILL/WONT, answered by DO/DONT)
    Local,
    /// The peer performs the option (negotiated with DO/DONT, answered by WILL/WONT)
    Remote,
}

/// Negotiation state of one side of one option
/// ([RFC1143](https://tools.ietf.org/html/rfc1143) Q Method).
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum QState {
    /// Disabled
    #[default]
    IsNo,
    /// Enabled
    IsYes,
    /// Disable requested, waiting for the answer
    WantNo,
    /// Disable requested and an enable queued behind it
    WantNoQueued,
    /// Enable requested, waiting for the answer
    WantYes,
    /// Enable requested and a disable queued behind it
    WantYesQueued,
}

impl QState {
    /// Whether the option is settled in the enabled state
    pub fn is_enabled(self) -> bool {
        self == QState::IsYes
    }

    /// Whether a request is outstanding
    pub fn is_pending(self) -> bool {
        !matches!(self, QState::IsNo | QState::IsYes)
    }
}

/// What the caller must do after a state transition
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Negotiation {
    /// Redundant request or indication, nothing changed
    Ignored,
    /// State changed, nothing to send
    Updated,
    /// Send the positive command (WILL for our side, DO for theirs)
    SendEnable,
    /// Send the negative command (WONT for our side, DONT for theirs)
    SendDisable,
}

/// Policy and negotiation state for one option code
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct OptionState {
    /// We agree to perform the option when asked
    pub we_can: bool,
    /// State of our side
    pub ours: QState,
    /// We agree to let the peer perform the option when offered
    pub they_should: bool,
    /// State of the peer's side
    pub theirs: QState,
}

/// Negotiation table indexed by option code.
///
/// Every transition follows RFC1143: a request is only put on the wire from a
/// settled state, a contrary request made while one is in flight is queued
/// (or cancels the queued one) and indications that answer nothing are
/// dropped without a reply, so negotiation can never loop.
#[derive(Clone, Debug)]
pub struct OptionTable {
    options: [OptionState; 256],
}

impl Default for OptionTable {
    fn default() -> Self {
        let mut table = OptionTable::empty();
        for option in [
            TelnetOption::TransmitBinary,
            TelnetOption::SuppressGoAhead,
            TelnetOption::Status,
            TelnetOption::TimingMark,
            TelnetOption::TerminalType,
            TelnetOption::TerminalSpeed,
            TelnetOption::WindowSize,
        ] {
            table.set_we_can(option, true);
        }
        for option in [
            TelnetOption::TransmitBinary,
            TelnetOption::SuppressGoAhead,
            TelnetOption::Status,
            TelnetOption::TimingMark,
            TelnetOption::Echo,
        ] {
            table.set_they_should(option, true);
        }
        table
    }
}

impl OptionTable {
    /// A table that refuses everything
    pub fn empty() -> Self {
        OptionTable {
            options: [OptionState::default(); 256],
        }
    }

    /// Full state of one option
    pub fn get(&self, option: TelnetOption) -> OptionState {
        self.options[usize::from(option.to_u8())]
    }

    fn entry(&mut self, option: TelnetOption) -> &mut OptionState {
        &mut self.options[usize::from(option.to_u8())]
    }

    /// Whether we agree to perform `option` when asked
    pub fn we_can(&self, option: TelnetOption) -> bool {
        self.get(option).we_can
    }

    /// Set whether we agree to perform `option`
    pub fn set_we_can(&mut self, option: TelnetOption, value: bool) {
        self.entry(option).we_can = value;
    }

    /// Whether we let the peer perform `option` when offered
    pub fn they_should(&self, option: TelnetOption) -> bool {
        self.get(option).they_should
    }

    /// Set whether we let the peer perform `option`
    pub fn set_they_should(&mut self, option: TelnetOption, value: bool) {
        self.entry(option).they_should = value;
    }

    /// Negotiation state of one side of `option`
    pub fn state(&self, option: TelnetOption, side: TelnetSide) -> QState {
        let entry = self.get(option);
        match side {
            TelnetSide::Local => entry.ours,
            TelnetSide::Remote => entry.theirs,
        }
    }

    /// Force the state of one side, bypassing negotiation
    pub fn reset(&mut self, option: TelnetOption, side: TelnetSide, state: QState) {
        let entry = self.entry(option);
        match side {
            TelnetSide::Local => entry.ours = state,
            TelnetSide::Remote => entry.theirs = state,
        }
    }

    /// Whether we currently perform `option`
    pub fn is_enabled_local(&self, option: TelnetOption) -> bool {
        self.get(option).ours.is_enabled()
    }

    /// Whether the peer currently performs `option`
    pub fn is_enabled_remote(&self, option: TelnetOption) -> bool {
        self.get(option).theirs.is_enabled()
    }

    /// We want to enable our side (WILL)
    pub fn request_will(&mut self, option: TelnetOption) -> Negotiation {
        request_enable(&mut self.entry(option).ours)
    }

    /// We want to disable our side (WONT)
    pub fn request_wont(&mut self, option: TelnetOption) -> Negotiation {
        request_disable(&mut self.entry(option).ours)
    }

    /// We want the peer to enable its side (DO)
    pub fn request_do(&mut self, option: TelnetOption) -> Negotiation {
        request_enable(&mut self.entry(option).theirs)
    }

    /// We want the peer to disable its side (DONT)
    pub fn request_dont(&mut self, option: TelnetOption) -> Negotiation {
        request_disable(&mut self.entry(option).theirs)
    }

    /// The peer sent DO
    pub fn receive_do(&mut self, option: TelnetOption) -> Negotiation {
        let entry = self.entry(option);
        receive_enable(&mut entry.ours, entry.we_can)
    }

    /// The peer sent DONT
    pub fn receive_dont(&mut self, option: TelnetOption) -> Negotiation {
        receive_disable(&mut self.entry(option).ours)
    }

    /// The peer sent WILL
    pub fn receive_will(&mut self, option: TelnetOption) -> Negotiation {
        let entry = self.entry(option);
        receive_enable(&mut entry.theirs, entry.they_should)
    }

    /// The peer sent WONT
    pub fn receive_wont(&mut self, option: TelnetOption) -> Negotiation {
        receive_disable(&mut self.entry(option).theirs)
    }
}

fn request_enable(state: &mut QState) -> Negotiation {
    match *state {
        QState::IsNo => {
            *state = QState::WantYes;
            Negotiation::SendEnable
        }
        QState::WantNo => {
            *state = QState::WantNoQueued;
            Negotiation::Updated
        }
        QState::WantYesQueued => {
            *state = QState::WantYes;
            Negotiation::Updated
        }
        // Already enabled, already negotiating, or already queued
        QState::IsYes | QState::WantYes | QState::WantNoQueued => Negotiation::Ignored,
    }
}

fn request_disable(state: &mut QState) -> Negotiation {
    match *state {
        QState::IsYes => {
            *state = QState::WantNo;
            Negotiation::SendDisable
        }
        QState::WantYes => {
            *state = QState::WantYesQueued;
            Negotiation::Updated
        }
        QState::WantNoQueued => {
            *state = QState::WantNo;
            Negotiation::Updated
        }
        QState::IsNo | QState::WantNo | QState::WantYesQueued => Negotiation::Ignored,
    }
}

fn receive_enable(state: &mut QState, agree: bool) -> Negotiation {
    match *state {
        QState::IsNo if agree => {
            *state = QState::IsYes;
            Negotiation::SendEnable
        }
        QState::IsNo => Negotiation::SendDisable,
        QState::IsYes => Negotiation::Ignored,
        // Our disable was answered with an enable: the peer is broken
        QState::WantNo => {
            *state = QState::IsNo;
            Negotiation::Updated
        }
        QState::WantNoQueued | QState::WantYes => {
            *state = QState::IsYes;
            Negotiation::Updated
        }
        QState::WantYesQueued => {
            *state = QState::WantNo;
            Negotiation::SendDisable
        }
    }
}

fn receive_disable(state: &mut QState) -> Negotiation {
    match *state {
        QState::IsNo => Negotiation::Ignored,
        QState::IsYes => {
            *state = QState::IsNo;
            Negotiation::SendDisable
        }
        QState::WantNo | QState::WantYes | QState::WantYesQueued => {
            *state = QState::IsNo;
            Negotiation::Updated
        }
        QState::WantNoQueued => {
            *state = QState::WantYes;
            Negotiation::SendEnable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_byte_mapping() {
        for byte in 0..=255u8 {
            assert_eq!(TelnetOption::from_u8(byte).to_u8(), byte);
        }
        assert_eq!(TelnetOption::from_u8(24), TelnetOption::TerminalType);
        assert_eq!(TelnetOption::from_u8(255), TelnetOption::ExtendedOptionsList);
        assert_eq!(TelnetOption::from_u8(200), TelnetOption::Unknown(200));
    }

    #[test]
    fn test_option_name() {
        assert_eq!(option_name(0), "TRANSMIT-BINARY");
        assert_eq!(option_name(31), "NAWS");
        assert_eq!(option_name(39), "NEW-ENVIRON");
        assert_eq!(option_name(40), "Option #40");
        assert_eq!(option_name(255), "EXTENDED-OPTIONS-LIST");
    }

    #[test]
    fn test_default_policy() {
        let table = OptionTable::default();
        assert!(table.we_can(TelnetOption::TerminalType));
        assert!(!table.we_can(TelnetOption::Echo));
        assert!(table.they_should(TelnetOption::Echo));
        assert!(!table.they_should(TelnetOption::WindowSize));
        assert_eq!(
            table.state(TelnetOption::Echo, TelnetSide::Local),
            QState::IsNo
        );
    }

    #[test]
    fn test_request_then_confirm() {
        let mut table = OptionTable::default();
        let option = TelnetOption::SuppressGoAhead;
        assert_eq!(table.request_will(option), Negotiation::SendEnable);
        assert_eq!(table.state(option, TelnetSide::Local), QState::WantYes);
        assert_eq!(table.request_will(option), Negotiation::Ignored);
        assert_eq!(table.receive_do(option), Negotiation::Updated);
        assert!(table.is_enabled_local(option));
        assert_eq!(table.request_will(option), Negotiation::Ignored);
    }

    #[test]
    fn test_unsolicited_request_policy() {
        let mut table = OptionTable::default();
        assert_eq!(
            table.receive_do(TelnetOption::TransmitBinary),
            Negotiation::SendEnable
        );
        assert!(table.is_enabled_local(TelnetOption::TransmitBinary));

        assert_eq!(table.receive_do(TelnetOption::Echo), Negotiation::SendDisable);
        assert!(!table.is_enabled_local(TelnetOption::Echo));

        assert_eq!(table.receive_will(TelnetOption::Echo), Negotiation::SendEnable);
        assert_eq!(
            table.receive_will(TelnetOption::Linemode),
            Negotiation::SendDisable
        );
    }

    #[test]
    fn test_queued_request_fires_on_answer() {
        let mut table = OptionTable::default();
        let option = TelnetOption::Status;
        table.reset(option, TelnetSide::Remote, QState::IsYes);

        assert_eq!(table.request_dont(option), Negotiation::SendDisable);
        assert_eq!(table.request_do(option), Negotiation::Updated);
        assert_eq!(table.state(option, TelnetSide::Remote), QState::WantNoQueued);
        assert_eq!(table.request_do(option), Negotiation::Ignored);

        // The WONT answering our DONT releases the queued DO
        assert_eq!(table.receive_wont(option), Negotiation::SendEnable);
        assert_eq!(table.state(option, TelnetSide::Remote), QState::WantYes);
        assert_eq!(table.receive_will(option), Negotiation::Updated);
        assert!(table.is_enabled_remote(option));
    }

    #[test]
    fn test_queued_request_cancelled() {
        let mut table = OptionTable::default();
        let option = TelnetOption::Status;
        assert_eq!(table.request_will(option), Negotiation::SendEnable);
        assert_eq!(table.request_wont(option), Negotiation::Updated);
        assert_eq!(table.state(option, TelnetSide::Local), QState::WantYesQueued);
        assert_eq!(table.request_will(option), Negotiation::Updated);
        assert_eq!(table.state(option, TelnetSide::Local), QState::WantYes);
    }

    #[test]
    fn test_disable_answered_by_disable() {
        let mut table = OptionTable::default();
        let option = TelnetOption::Echo;
        table.reset(option, TelnetSide::Local, QState::IsYes);
        assert_eq!(table.request_wont(option), Negotiation::SendDisable);
        assert_eq!(table.receive_dont(option), Negotiation::Updated);
        assert_eq!(table.state(option, TelnetSide::Local), QState::IsNo);
        assert_eq!(table.receive_dont(option), Negotiation::Ignored);
    }

    #[test]
    fn test_peer_disables_enabled_option() {
        let mut table = OptionTable::default();
        let option = TelnetOption::SuppressGoAhead;
        table.reset(option, TelnetSide::Remote, QState::IsYes);
        assert_eq!(table.receive_wont(option), Negotiation::SendDisable);
        assert_eq!(table.state(option, TelnetSide::Remote), QState::IsNo);
    }

    #[test]
    fn test_refused_enable_with_queued_disable() {
        let mut table = OptionTable::default();
        let option = TelnetOption::TerminalType;
        table.request_do(option);
        table.request_dont(option);
        assert_eq!(table.receive_wont(option), Negotiation::Updated);
        assert_eq!(table.state(option, TelnetSide::Remote), QState::IsNo);
    }

    #[test]
    fn test_accepted_enable_with_queued_disable() {
        let mut table = OptionTable::default();
        let option = TelnetOption::TerminalType;
        table.request_do(option);
        table.request_dont(option);
        assert_eq!(table.receive_will(option), Negotiation::SendDisable);
        assert_eq!(table.state(option, TelnetSide::Remote), QState::WantNo);
    }
}
