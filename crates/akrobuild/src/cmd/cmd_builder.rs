// akro: A declarative build front end for native artifacts.
// Copyright (C) 2024 International Digital Economy Academy
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//
// For inquiries, you can contact us via e-mail at jichuruanjian@idea.edu.cn.

enum Part {
    /// A single argument; double-quoted in the rendered command if it
    /// contains a space.
    Arg(String),
    /// A pre-rendered chunk (configured flag strings, extra link
    /// parameters); appended exactly as given.
    Verbatim(String),
}

pub struct CommandBuilder {
    command: String,
    parts: Vec<Part>,
}

impl CommandBuilder {
    pub fn new(command: &str) -> CommandBuilder {
        CommandBuilder {
            command: command.into(),
            parts: Vec::new(),
        }
    }

    pub fn arg(&mut self, arg: &str) -> &mut CommandBuilder {
        self.parts.push(Part::Arg(arg.into()));
        self
    }

    pub fn args<I, S>(&mut self, args: I) -> &mut CommandBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for arg in args {
            self.parts.push(Part::Arg(arg.into()));
        }
        self
    }

    pub fn arg_with_cond(&mut self, cond: bool, arg: &str) -> &mut CommandBuilder {
        if cond {
            self.parts.push(Part::Arg(arg.into()));
        }
        self
    }

    /// Appends a chunk without quoting. Empty chunks are dropped so an
    /// unset flag string does not leave a double space behind.
    pub fn verbatim(&mut self, chunk: &str) -> &mut CommandBuilder {
        if !chunk.is_empty() {
            self.parts.push(Part::Verbatim(chunk.into()));
        }
        self
    }

    pub fn build(&self) -> String {
        let mut cmd = self.command.clone();
        for part in self.parts.iter() {
            cmd.push(' ');
            match part {
                Part::Arg(arg) if arg.contains(' ') => {
                    cmd.push('"');
                    cmd.push_str(arg);
                    cmd.push('"');
                }
                Part::Arg(arg) => cmd.push_str(arg),
                Part::Verbatim(chunk) => cmd.push_str(chunk),
            }
        }
        cmd
    }
}
